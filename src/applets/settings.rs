//! Panel brightness adjustment.

use std::thread;

use log::info;

use super::{Applet, AppletContext, poll_input};
use crate::colors::{WHITE_BOLD, YELLOW};
use crate::config::{APPLET_POLL_INTERVAL, BRIGHTNESS_STEP};
use crate::error::AppletError;
use crate::input::{Button, InputHandle, InputSnapshot};
use crate::surface::RenderSurface;

const TITLE_Y: i32 = 10;
const BAR_Y: i32 = 14;

/// Adjusts panel brightness with left/right.
pub struct SettingsApplet {
    name: String,
    input: InputHandle,
}

impl SettingsApplet {
    /// Build from a system context.
    pub fn new(context: AppletContext) -> Self {
        Self {
            name: context.name,
            input: context.input,
        }
    }

    /// Apply left/right edges to the surface brightness.
    fn adjust(
        surface: &mut RenderSurface,
        edges: InputSnapshot,
    ) {
        let current = surface.brightness();
        if edges.pressed(Button::Right) {
            surface.set_brightness(current.saturating_add(BRIGHTNESS_STEP));
        } else if edges.pressed(Button::Left) {
            surface.set_brightness(current.saturating_sub(BRIGHTNESS_STEP));
        }
    }

    fn render(surface: &mut RenderSurface) {
        surface.clear();
        surface.draw_centered_text("Brightness", WHITE_BOLD, Some(TITLE_Y));
        surface.draw_progress_bar(surface.brightness(), YELLOW, BAR_Y);
        surface.swap();
    }
}

impl Applet for SettingsApplet {
    fn name(&self) -> &str { &self.name }

    fn start(
        &mut self,
        surface: &mut RenderSurface,
    ) -> Result<(), AppletError> {
        info!("{}: starting at brightness {}%", self.name, surface.brightness());
        Self::render(surface);
        while let Some(edges) = poll_input(&self.input)? {
            Self::adjust(surface, edges);
            Self::render(surface);
            thread::sleep(APPLET_POLL_INTERVAL);
        }
        Ok(())
    }

    fn stop(
        &mut self,
        surface: &mut RenderSurface,
    ) {
        info!("{}: brightness left at {}%", self.name, surface.brightness());
    }
}
