//! Shows the descriptive fields of the selected catalog entry.
//!
//! Fields rotate every [`INFO_ROTATE_INTERVAL`] or on a select press.

use std::thread;
use std::time::Instant;

use log::info;

use super::{Applet, AppletContext, poll_input};
use crate::colors::{RED, WHITE_MUTED};
use crate::config::{APPLET_POLL_INTERVAL, INFO_ROTATE_INTERVAL};
use crate::error::AppletError;
use crate::input::{Button, InputHandle};
use crate::manifest::Manifest;
use crate::surface::RenderSurface;

const FIELDS: [(&str, &str); 4] = [
    ("name", "Name"),
    ("description", "Description"),
    ("version", "Version"),
    ("author", "Author"),
];

const TITLE_Y: i32 = 7;

/// Cycles through the descriptive fields of one manifest.
pub struct InfoViewerApplet {
    name: String,
    input: InputHandle,
    manifest: Option<Manifest>,
    field: usize,
}

impl InfoViewerApplet {
    /// Viewer for `manifest`. With `None` it shows a placeholder.
    pub fn new(
        context: AppletContext,
        manifest: Option<Manifest>,
    ) -> Self {
        Self {
            name: context.name,
            input: context.input,
            manifest,
            field: 0,
        }
    }

    /// Title and value of the field currently shown.
    pub fn current_field(&self) -> Option<(&'static str, &str)> {
        let manifest = self.manifest.as_ref()?;
        let (key, title) = FIELDS[self.field % FIELDS.len()];
        manifest.field(key).map(|value| (title, value))
    }

    fn render(
        &self,
        surface: &mut RenderSurface,
    ) {
        surface.clear();
        match self.current_field() {
            Some((title, value)) => {
                surface.draw_centered_text(title, RED, Some(TITLE_Y));
                surface.draw_centered_text(value, WHITE_MUTED, None);
            }
            None => {
                surface.draw_centered_text("No applet selected", WHITE_MUTED, None);
            }
        }
        surface.swap();
    }
}

impl Applet for InfoViewerApplet {
    fn name(&self) -> &str { &self.name }

    fn start(
        &mut self,
        surface: &mut RenderSurface,
    ) -> Result<(), AppletError> {
        info!(
            "{}: showing '{}'",
            self.name,
            self.manifest.as_ref().map_or("<none>", |m| m.name.as_str())
        );
        self.render(surface);
        let mut last_switch = Instant::now();

        while let Some(edges) = poll_input(&self.input)? {
            if edges.pressed(Button::Select) || last_switch.elapsed() >= INFO_ROTATE_INTERVAL {
                self.field = (self.field + 1) % FIELDS.len();
                last_switch = Instant::now();
            }
            self.render(surface);
            thread::sleep(APPLET_POLL_INTERVAL);
        }
        Ok(())
    }
}
