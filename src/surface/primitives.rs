//! Low-level shape primitives shared by the surface and applets.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use super::layout::BoundingBox;

/// Horizontal inset of the progress bar from both panel edges.
const BAR_MARGIN: u32 = 2;

/// Progress bar height including its outline.
const BAR_HEIGHT: u32 = 5;

/// Draw a 1px outline exactly covering `bbox`.
pub fn draw_outline<D>(
    display: &mut D,
    bbox: &BoundingBox,
    color: Rgb888,
) where
    D: DrawTarget<Color = Rgb888>,
{
    bbox.to_rectangle()
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(display)
        .ok();
}

/// Draw a horizontal progress bar across the panel with its top edge at `y`.
///
/// The full track is outlined and the first `percent` of it is filled.
/// Values above 100 are drawn as a full bar.
pub fn draw_progress_bar<D>(
    display: &mut D,
    percent: u8,
    color: Rgb888,
    y: i32,
) where
    D: DrawTarget<Color = Rgb888> + OriginDimensions,
{
    let width = display.size().width;
    if width <= BAR_MARGIN * 2 {
        return;
    }
    let track_width = width - BAR_MARGIN * 2;
    let track = Rectangle::new(Point::new(BAR_MARGIN as i32, y), Size::new(track_width, BAR_HEIGHT));
    track
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(display)
        .ok();

    let filled = track_width * u32::from(percent.min(100)) / 100;
    if filled > 0 {
        Rectangle::new(track.top_left, Size::new(filled, BAR_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(display)
            .ok();
    }
}
