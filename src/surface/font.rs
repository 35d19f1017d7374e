//! Font selection, glyph metrics and pixel-width word wrapping.
//!
//! Widths are always summed glyph by glyph from the font's own text renderer,
//! so wrapping stays correct if a font with per-glyph advances is added.

use embedded_graphics::mono_font::ascii::FONT_4X6;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Baseline;
use embedded_graphics::text::renderer::TextRenderer;
use profont::PROFONT_9_POINT;

use crate::colors::WHITE_BOLD;

/// Fonts available on the panel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub enum Font {
    /// 4x6 bitmap font, 16 glyphs per 64px line. Menu and body text.
    #[default]
    Small,
    /// `ProFont` 9pt. Large readouts such as the idle clock.
    Large,
}

impl Font {
    /// The underlying bitmap font.
    pub const fn mono(self) -> &'static MonoFont<'static> {
        match self {
            Self::Small => &FONT_4X6,
            Self::Large => &PROFONT_9_POINT,
        }
    }

    /// Text style for drawing in `color`.
    pub const fn style(
        self,
        color: Rgb888,
    ) -> MonoTextStyle<'static, Rgb888> {
        MonoTextStyle::new(self.mono(), color)
    }

    /// Height of one rendered line.
    pub fn line_height(self) -> u32 { self.mono().character_size.height }

    /// Distance from the top of a line to its alphabetic baseline.
    pub fn baseline(self) -> u32 { self.mono().baseline }

    /// Horizontal advance of a single glyph, including inter-glyph spacing.
    pub fn glyph_advance(
        self,
        ch: char,
    ) -> u32 {
        let mut buf = [0u8; 4];
        let metrics = self
            .style(WHITE_BOLD)
            .measure_string(ch.encode_utf8(&mut buf), Point::zero(), Baseline::Alphabetic);
        metrics.bounding_box.size.width + self.mono().character_spacing
    }

    /// Rendered width of `text` in pixels (no trailing spacing).
    pub fn text_width(
        self,
        text: &str,
    ) -> u32 {
        let advance: u32 = text.chars().map(|ch| self.glyph_advance(ch)).sum();
        if advance == 0 {
            0
        } else {
            advance - self.mono().character_spacing
        }
    }

    /// Word-wrap `text` so every line fits in `max_width` pixels.
    ///
    /// Words wider than a whole line are broken between glyphs. Runs of
    /// whitespace collapse to a single space.
    pub fn wrap(
        self,
        text: &str,
        max_width: u32,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        let mut line = String::new();

        for word in text.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_owned()
            } else {
                format!("{line} {word}")
            };
            if self.text_width(&candidate) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(core::mem::take(&mut line));
            }
            if self.text_width(word) <= max_width {
                line = word.to_owned();
                continue;
            }

            for ch in word.chars() {
                line.push(ch);
                if line.chars().count() > 1 && self.text_width(&line) > max_width {
                    line.pop();
                    lines.push(core::mem::take(&mut line));
                    line.push(ch);
                }
            }
        }

        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Metrics Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_small_font_metrics() {
        assert_eq!(Font::Small.glyph_advance('A'), 4, "FONT_4X6 glyphs advance 4px");
        assert_eq!(Font::Small.line_height(), 6);
        assert_eq!(Font::Small.text_width("ABCD"), 16);
        assert_eq!(Font::Small.text_width(""), 0);
    }

    #[test]
    fn test_text_width_sums_glyphs() {
        let font = Font::Large;
        let expected: u32 = "12:34".chars().map(|ch| font.glyph_advance(ch)).sum::<u32>()
            - font.mono().character_spacing;
        assert_eq!(font.text_width("12:34"), expected);
    }

    // -------------------------------------------------------------------------
    // Wrapping Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_wrap_fits_on_one_line() {
        assert_eq!(Font::Small.wrap("Hello world", 64), vec!["Hello world"]);
    }

    #[test]
    fn test_wrap_breaks_between_words() {
        // 16 glyphs per 64px line
        let lines = Font::Small.wrap("Applet Information Viewer", 64);
        assert_eq!(lines, vec!["Applet", "Information", "Viewer"]);
        for line in &lines {
            assert!(Font::Small.text_width(line) <= 64, "Line '{line}' exceeds width");
        }
    }

    #[test]
    fn test_wrap_packs_words_greedily() {
        let lines = Font::Small.wrap("a b c d e f g h i j", 20);
        assert_eq!(lines, vec!["a b c", "d e f", "g h i", "j"]);
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let lines = Font::Small.wrap("abcdefghij", 16);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(Font::Small.wrap("", 64).is_empty());
        assert!(Font::Small.wrap("   ", 64).is_empty());
    }
}
