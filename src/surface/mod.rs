//! Double-buffered render surface with fail-visible text layout.
//!
//! The surface owns two [`FrameBuffer`]s. All drawing goes to the back buffer;
//! [`RenderSurface::swap`] exchanges the buffers and hands the new front frame
//! to a [`FramePresenter`] (the panel driver, a simulator window, or nothing).
//!
//! Text draws are checked before they touch the frame: the wrapped block's
//! bounding box must stay on the panel and must not overlap another text block
//! drawn since the last [`clear`](RenderSurface::clear). A draw that fails
//! either check is replaced by a magenta outline of the box, which makes layout
//! bugs obvious on the panel instead of silently garbling text.

mod font;
mod framebuffer;
mod layout;
mod primitives;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

pub use font::Font;
pub use framebuffer::FrameBuffer;
pub use layout::{BoundingBox, LayoutStats, Region, RegionKey, RegionRegistry};
pub use primitives::{draw_outline, draw_progress_bar};

use crate::colors::{BLACK, MAGENTA, RED, YELLOW};
use crate::config::DEFAULT_BRIGHTNESS;

/// Consumer of completed frames.
pub trait FramePresenter {
    /// Show `frame` at `brightness` percent (0..=100).
    fn present(
        &mut self,
        frame: &FrameBuffer,
        brightness: u8,
    );
}

/// Presenter that discards frames. Used for headless runs and tests.
#[derive(Clone, Copy, Default, Debug)]
pub struct NullPresenter;

impl FramePresenter for NullPresenter {
    fn present(
        &mut self,
        _frame: &FrameBuffer,
        _brightness: u8,
    ) {
    }
}

/// Kind of full-screen status message.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MessageKind {
    /// Yellow, e.g. "Loading ...".
    Loading,
    /// Red, e.g. "Failed to load".
    Error,
}

impl MessageKind {
    /// Text color for this kind of message.
    pub const fn color(self) -> Rgb888 {
        match self {
            Self::Loading => YELLOW,
            Self::Error => RED,
        }
    }
}

/// Scale a color's channels by `brightness` percent.
pub fn dim(
    color: Rgb888,
    brightness: u8,
) -> Rgb888 {
    let level = u16::from(brightness.min(100));
    let scale = |channel: u8| (u16::from(channel) * level / 100) as u8;
    Rgb888::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

/// The drawing target shared by the menu and the running applet.
pub struct RenderSurface {
    back: FrameBuffer,
    front: FrameBuffer,
    regions: RegionRegistry,
    stats: LayoutStats,
    font: Font,
    brightness: u8,
    frames_published: u64,
    presenter: Box<dyn FramePresenter>,
}

impl RenderSurface {
    /// Surface of `width` x `height` publishing to `presenter`.
    pub fn new(
        width: u32,
        height: u32,
        presenter: Box<dyn FramePresenter>,
    ) -> Self {
        Self {
            back: FrameBuffer::new(width, height),
            front: FrameBuffer::new(width, height),
            regions: RegionRegistry::new(),
            stats: LayoutStats::default(),
            font: Font::default(),
            brightness: DEFAULT_BRIGHTNESS,
            frames_published: 0,
            presenter,
        }
    }

    /// Surface whose frames go nowhere.
    pub fn headless(
        width: u32,
        height: u32,
    ) -> Self {
        Self::new(width, height, Box::new(NullPresenter))
    }

    #[inline]
    pub const fn width(&self) -> u32 { self.back.width() }

    #[inline]
    pub const fn height(&self) -> u32 { self.back.height() }

    // -------------------------------------------------------------------------
    // Buffers
    // -------------------------------------------------------------------------

    /// Frame currently being drawn.
    pub const fn back(&self) -> &FrameBuffer { &self.back }

    /// Frame most recently published.
    pub const fn front(&self) -> &FrameBuffer { &self.front }

    /// Direct access to the back buffer for custom `embedded-graphics` drawing.
    ///
    /// Anything drawn this way bypasses overlap detection.
    pub const fn canvas(&mut self) -> &mut FrameBuffer { &mut self.back }

    /// Clear the back buffer and forget every registered text region.
    pub fn clear(&mut self) {
        self.back.clear(BLACK).ok();
        self.regions.clear();
    }

    /// Publish the back buffer and continue drawing on the previous front.
    pub fn swap(&mut self) {
        core::mem::swap(&mut self.back, &mut self.front);
        self.presenter.present(&self.front, self.brightness);
        self.frames_published += 1;
    }

    /// Clear both buffers and publish the empty frame.
    pub fn blank(&mut self) {
        self.clear();
        self.swap();
        self.clear();
    }

    /// Number of frames handed to the presenter so far.
    pub const fn frames_published(&self) -> u64 { self.frames_published }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    /// Font used by the text calls.
    pub const fn font(&self) -> Font { self.font }

    /// Switch the font for subsequent text calls.
    pub const fn set_font(
        &mut self,
        font: Font,
    ) {
        self.font = font;
    }

    /// Brightness in percent, applied when a frame is presented.
    pub const fn brightness(&self) -> u8 { self.brightness }

    /// Set the panel brightness, clamped to 100%.
    pub fn set_brightness(
        &mut self,
        brightness: u8,
    ) {
        self.brightness = brightness.min(100);
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// Regions registered since the last clear.
    pub const fn regions(&self) -> &RegionRegistry { &self.regions }

    /// Layout counters since the surface was created.
    pub const fn layout_stats(&self) -> LayoutStats { self.stats }

    /// Width of `text` in the current font.
    pub fn text_width(
        &self,
        text: &str,
    ) -> u32 {
        self.font.text_width(text)
    }

    /// Wrap `text` in the current font to `max_width` pixels.
    pub fn wrap_text(
        &self,
        text: &str,
        max_width: u32,
    ) -> Vec<String> {
        self.font.wrap(text, max_width)
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Draw `text` with its first baseline at `(x, y)`, wrapped to the panel's right edge.
    ///
    /// Returns `false` if the block overlapped another region or left the panel;
    /// in that case only an outline of the block was drawn. Blank text draws
    /// nothing, registers nothing and returns `true`.
    pub fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        color: Rgb888,
    ) -> bool {
        if text.trim().is_empty() {
            return true;
        }

        let key = RegionKey::new(x, y, self.font, text);
        let cached = self.regions.get(&key).cloned();
        let is_cached = cached.is_some();
        let region = match cached {
            Some(region) => {
                self.stats.reused += 1;
                region
            }
            None => {
                self.stats.computed += 1;
                self.layout(x, y, text)
            }
        };

        if self.regions.collides(&key, &region.bbox) || !region.bbox.is_within(self.width(), self.height()) {
            self.stats.rejected += 1;
            draw_outline(&mut self.back, &region.bbox, MAGENTA);
            return false;
        }

        let style = self.font.style(color);
        let line_height = self.font.line_height() as i32;
        for (i, line) in region.lines.iter().enumerate() {
            Text::new(line, Point::new(x, y + i as i32 * line_height), style)
                .draw(&mut self.back)
                .ok();
        }

        if !is_cached {
            self.regions.insert(key, region);
        }
        true
    }

    /// Draw `text` horizontally centered, one region per wrapped line.
    ///
    /// `y` is the first baseline; `None` centers the whole block vertically.
    /// Returns `false` if any line was rejected.
    pub fn draw_centered_text(
        &mut self,
        text: &str,
        color: Rgb888,
        y: Option<i32>,
    ) -> bool {
        let lines = self.wrap_text(text, self.width());
        let line_height = self.font.line_height() as i32;
        let first_baseline = y.unwrap_or_else(|| {
            let block_height = lines.len() as i32 * line_height;
            (self.height() as i32 - block_height) / 2 + self.font.baseline() as i32
        });

        let mut all_drawn = true;
        for (i, line) in lines.iter().enumerate() {
            let x = (self.width() as i32 - self.text_width(line) as i32) / 2;
            all_drawn &= self.draw_text(x, first_baseline + i as i32 * line_height, line, color);
        }
        all_drawn
    }

    /// Draw a full-width progress bar with its top edge at `y`.
    pub fn draw_progress_bar(
        &mut self,
        percent: u8,
        color: Rgb888,
        y: i32,
    ) {
        draw_progress_bar(&mut self.back, percent, color, y);
    }

    /// Replace the panel contents with a centered status message.
    pub fn show_message(
        &mut self,
        message: &str,
        kind: MessageKind,
    ) {
        self.clear();
        self.draw_centered_text(message, kind.color(), None);
        self.swap();
    }

    fn layout(
        &self,
        x: i32,
        y: i32,
        text: &str,
    ) -> Region {
        let available = (self.width() as i32 - x).max(0) as u32;
        let lines = self.font.wrap(text, available);
        Region {
            bbox: BoundingBox::for_text(x, y, self.font, &lines),
            lines,
        }
    }
}
