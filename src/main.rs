// Crate-level lints: Allow common graphics patterns that pedantic lints flag
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

//! Desktop simulator for the applet menu.
//!
//! Renders the 64x64 panel into an SDL window and feeds keyboard levels into
//! the navigator's input source.
//!
//! ```text
//! W / S / A / D   up / down / left / right
//! E               select
//! Q               back (asks the running applet to return)
//! X / Y           information viewer / settings
//! C               interrupt the running applet
//! ```
//!
//! Ctrl+C in the terminal interrupts the running applet; a second one at the
//! menu quits.
//!
//! Usage: `matrix-applets [APPLET_ROOT]` (defaults to `applets`).

use std::path::PathBuf;
use std::sync::Arc;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use log::{info, warn};
use matrix_applets::Navigator;
use matrix_applets::colors::BLACK;
use matrix_applets::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use matrix_applets::input::{Button, InputBackend, InputPublisher, InputSource};
use matrix_applets::surface::{FrameBuffer, FramePresenter, RenderSurface, dim};

/// Scale factor of the simulator window. 64px is unreadably small at 1:1.
const WINDOW_SCALE: u32 = 8;

fn key_button(keycode: Keycode) -> Option<Button> {
    match keycode {
        Keycode::W => Some(Button::Up),
        Keycode::S => Some(Button::Down),
        Keycode::A => Some(Button::Left),
        Keycode::D => Some(Button::Right),
        Keycode::E => Some(Button::Select),
        Keycode::Q => Some(Button::Back),
        Keycode::X => Some(Button::X),
        Keycode::Y => Some(Button::Y),
        _ => None,
    }
}

/// Shows published frames in a window and turns window events into input.
///
/// SDL events can only be read on the thread that owns the window, so they are
/// pumped here, once per published frame.
struct WindowPresenter {
    display: SimulatorDisplay<Rgb888>,
    window: Window,
    publisher: InputPublisher,
}

impl WindowPresenter {
    fn new(publisher: InputPublisher) -> Self {
        let mut display = SimulatorDisplay::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
        display.clear(BLACK).ok();
        let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
        Self {
            display,
            window: Window::new("Matrix Applets", &output_settings),
            publisher,
        }
    }

    fn pump_events(&mut self) {
        for event in self.window.events() {
            match event {
                SimulatorEvent::Quit => {
                    info!("Window closed");
                    self.publisher.request_shutdown();
                    self.publisher.raise_interrupt();
                }
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    // Ignore OS key repeat, a held key is one press
                    if repeat {
                        continue;
                    }
                    match keycode {
                        Keycode::C => self.publisher.raise_interrupt(),
                        Keycode::Q => {
                            self.publisher.request_exit();
                            self.publisher.set(Button::Back, true);
                        }
                        other => {
                            if let Some(button) = key_button(other) {
                                self.publisher.set(button, true);
                            }
                        }
                    }
                }
                SimulatorEvent::KeyUp { keycode, .. } => {
                    if let Some(button) = key_button(keycode) {
                        self.publisher.set(button, false);
                    }
                }
                _ => {}
            }
        }
    }
}

impl FramePresenter for WindowPresenter {
    fn present(
        &mut self,
        frame: &FrameBuffer,
        brightness: u8,
    ) {
        self.display
            .draw_iter(frame.pixels().map(|Pixel(point, color)| Pixel(point, dim(color, brightness))))
            .ok();
        self.window.update(&self.display);
        self.pump_events();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let root = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("applets"), PathBuf::from);
    info!("Applet root: {}", root.display());

    let (source, publisher) = InputSource::manual(InputBackend::Keyboard);
    let input = Arc::new(source);

    // Ctrl+C unwinds the running applet, or ends the menu when nothing runs
    #[cfg(unix)]
    let _signals = matrix_applets::signals::SignalListener::register(Arc::clone(&input))
        .inspect_err(|err| warn!("Signal handlers not installed: {err}"))
        .ok();
    let surface = RenderSurface::new(SCREEN_WIDTH, SCREEN_HEIGHT, Box::new(WindowPresenter::new(publisher)));

    let mut navigator = Navigator::with_applet_root(&root, surface, input);
    navigator.run();
}
