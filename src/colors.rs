//! Color constants for the LED matrix.
//!
//! The panel is driven with 24-bit color, so everything is expressed as
//! `Rgb888`. Primary colors come from the `RgbColor` trait constants; the
//! whites are tuned for how they read on an LED matrix rather than a monitor.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

// =============================================================================
// Standard Colors (from RgbColor trait)
// =============================================================================

/// Pure black. Background and cleared pixels.
pub const BLACK: Rgb888 = Rgb888::BLACK;

/// Selected menu entry, error messages, information viewer titles.
pub const RED: Rgb888 = Rgb888::RED;

/// Loading messages and the brightness bar.
pub const YELLOW: Rgb888 = Rgb888::YELLOW;

/// Fail-visible layout outline. Nothing else on the panel uses it.
pub const MAGENTA: Rgb888 = Rgb888::MAGENTA;

// =============================================================================
// Whites
// =============================================================================

/// Full-intensity white for titles.
pub const WHITE_BOLD: Rgb888 = Rgb888::WHITE;

/// Unselected menu entries, page indicator, idle clock.
pub const WHITE_MUTED: Rgb888 = Rgb888::new(100, 100, 100);
