//! Fallback applet launched after a period without input.
//!
//! Shows a large wall clock and the system uptime. Any input edge ends it.

use core::fmt::Write;
use std::thread;
use std::time::Instant;

use chrono::{Local, Timelike};
use heapless::String;
use log::{debug, info};
use sysinfo::System;

use super::{Applet, AppletContext, poll_input};
use crate::colors::WHITE_MUTED;
use crate::config::APPLET_POLL_INTERVAL;
use crate::error::AppletError;
use crate::input::InputHandle;
use crate::surface::{Font, RenderSurface};

const CLOCK_Y: i32 = 16;

/// Wall clock and uptime shown after the idle threshold.
pub struct IdleApplet {
    name: std::string::String,
    input: InputHandle,
}

/// Seconds since boot, or `None` where the platform does not report it.
fn system_uptime() -> Option<u64> {
    Some(System::uptime()).filter(|secs| *secs > 0)
}

/// `HH:MM:SS`.
pub fn format_clock(
    hour: u32,
    minute: u32,
    second: u32,
) -> String<8> {
    let mut text = String::new();
    write!(text, "{hour:02}:{minute:02}:{second:02}").ok();
    text
}

/// `Uptime: <n>s`.
pub fn format_uptime(seconds: u64) -> String<32> {
    let mut text = String::new();
    write!(text, "Uptime: {seconds}s").ok();
    text
}

impl IdleApplet {
    /// Build from a system context; idle reads no options.
    pub fn new(context: AppletContext) -> Self {
        Self {
            name: context.name,
            input: context.input,
        }
    }

    fn render(
        surface: &mut RenderSurface,
        uptime: u64,
    ) {
        let now = Local::now();
        surface.clear();

        let previous = surface.font();
        surface.set_font(Font::Large);
        surface.draw_centered_text(
            &format_clock(now.hour(), now.minute(), now.second()),
            WHITE_MUTED,
            Some(CLOCK_Y),
        );
        surface.set_font(previous);

        surface.draw_centered_text(&format_uptime(uptime), WHITE_MUTED, None);
        surface.swap();
    }
}

impl Applet for IdleApplet {
    fn name(&self) -> &str { &self.name }

    fn start(
        &mut self,
        surface: &mut RenderSurface,
    ) -> Result<(), AppletError> {
        info!("{}: starting", self.name);
        let started = Instant::now();
        let boot_offset = system_uptime().unwrap_or_else(|| {
            debug!("System uptime unavailable, counting from idle start");
            0
        });
        let uptime = || boot_offset + started.elapsed().as_secs();

        Self::render(surface, uptime());
        while let Some(edges) = poll_input(&self.input)? {
            if edges.any() {
                debug!("{}: input received, returning to menu", self.name);
                self.input.request_exit();
                continue;
            }
            Self::render(surface, uptime());
            thread::sleep(APPLET_POLL_INTERVAL);
        }
        Ok(())
    }

    fn stop(
        &mut self,
        surface: &mut RenderSurface,
    ) {
        info!("{}: stopping", self.name);
        surface.set_font(Font::Small);
    }
}
