//! Starting point for new applets.
//!
//! Alternates two words in a random color once a second. Copy this file,
//! rename the type and register its factory under the new package's entry
//! point.

use std::thread;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb888;
use log::info;
use rand::Rng;

use super::{Applet, AppletContext, poll_input};
use crate::colors::WHITE_MUTED;
use crate::config::APPLET_POLL_INTERVAL;
use crate::error::AppletError;
use crate::input::InputHandle;
use crate::surface::RenderSurface;

const WORDS: [&str; 2] = ["Template", "Applet"];
const WORD_INTERVAL: Duration = Duration::from_secs(1);
const WORD_POS: (i32, i32) = (18, 32);
const OPTION_Y: i32 = 50;

/// Sample applet: cycles a few words in random colors and shows its `example_option`.
pub struct TemplateApplet {
    name: String,
    input: InputHandle,
    option_value: Option<String>,
    word: usize,
    color: Rgb888,
}

impl TemplateApplet {
    /// Build from the package context. Without `example_option` only the words are drawn.
    pub fn new(context: AppletContext) -> Self {
        let option_value = context.options.get("example_option").map(|value| match value.as_str() {
            Some(text) => text.to_owned(),
            None => value.to_string(),
        });
        Self {
            name: context.name,
            input: context.input,
            option_value,
            word: 0,
            color: WHITE_MUTED,
        }
    }

    /// Factory registered for the `TemplateApplet` type.
    pub fn create(context: AppletContext) -> Box<dyn Applet> { Box::new(Self::new(context)) }

    /// Word shown right now.
    pub fn current_word(&self) -> &'static str { WORDS[self.word % WORDS.len()] }

    /// Show the next word in a new color.
    fn advance(&mut self) {
        self.word = (self.word + 1) % WORDS.len();
        self.color = random_color();
    }

    fn render(
        &self,
        surface: &mut RenderSurface,
    ) {
        surface.clear();
        surface.draw_text(WORD_POS.0, WORD_POS.1, self.current_word(), self.color);
        if let Some(option) = &self.option_value {
            surface.draw_centered_text(option, WHITE_MUTED, Some(OPTION_Y));
        }
        surface.swap();
    }
}

fn random_color() -> Rgb888 {
    let mut rng = rand::thread_rng();
    Rgb888::new(rng.gen_range(0..=255), rng.gen_range(0..=255), rng.gen_range(0..=255))
}

impl Applet for TemplateApplet {
    fn name(&self) -> &str { &self.name }

    fn start(
        &mut self,
        surface: &mut RenderSurface,
    ) -> Result<(), AppletError> {
        info!("{}: starting", self.name);
        self.color = random_color();
        self.render(surface);
        let mut last_switch = Instant::now();

        while poll_input(&self.input)?.is_some() {
            if last_switch.elapsed() >= WORD_INTERVAL {
                self.advance();
                last_switch = Instant::now();
            }
            self.render(surface);
            thread::sleep(APPLET_POLL_INTERVAL);
        }
        Ok(())
    }

    fn stop(
        &mut self,
        surface: &mut RenderSurface,
    ) {
        info!("{}: stopping", self.name);
        surface.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::input::{InputBackend, InputSource};
    use crate::manifest::Options;

    fn context(options: Options) -> (AppletContext, crate::input::InputPublisher) {
        let (source, publisher) = InputSource::manual(InputBackend::LineCommands);
        let context = AppletContext {
            name: "Template".into(),
            input: Arc::new(source),
            options,
            resource_dir: PathBuf::from("resources"),
        };
        (context, publisher)
    }

    #[test]
    fn test_reads_example_option() {
        let mut options = Options::new();
        options.insert("example_option".into(), json!("hello"));
        let (ctx, _publisher) = context(options);
        let applet = TemplateApplet::new(ctx);
        assert_eq!(applet.option_value.as_deref(), Some("hello"));
    }

    #[test]
    fn test_start_draws_then_returns_on_exit() {
        let (ctx, publisher) = context(Options::new());
        let mut applet = TemplateApplet::new(ctx);
        let mut surface = RenderSurface::headless(64, 64);
        publisher.request_exit();

        assert_eq!(applet.start(&mut surface), Ok(()));
        assert_eq!(surface.frames_published(), 1, "First frame is published before polling");
        assert!(!surface.front().is_blank());
        assert_eq!(applet.current_word(), "Template");
    }

    #[test]
    fn test_advance_alternates_words() {
        let (ctx, _publisher) = context(Options::new());
        let mut applet = TemplateApplet::new(ctx);
        applet.advance();
        assert_eq!(applet.current_word(), "Applet");
        applet.advance();
        assert_eq!(applet.current_word(), "Template");
    }

    #[test]
    fn test_start_honors_interrupt() {
        let (ctx, publisher) = context(Options::new());
        let mut applet = TemplateApplet::new(ctx);
        let mut surface = RenderSurface::headless(64, 64);
        publisher.raise_interrupt();
        assert_eq!(applet.start(&mut surface), Err(AppletError::Interrupted));
    }
}
