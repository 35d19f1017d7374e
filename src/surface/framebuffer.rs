//! In-memory frame used for both halves of the double buffer.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::colors::BLACK;

/// A `width × height` grid of `Rgb888` pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl FrameBuffer {
    /// Create a black frame.
    pub fn new(
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            size: Size::new(width, height),
            pixels: vec![BLACK; (width * height) as usize],
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 { self.size.width }

    #[inline]
    pub const fn height(&self) -> u32 { self.size.height }

    /// Color at `point`, or `None` outside the frame.
    pub fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb888> {
        self.index_of(point).map(|idx| self.pixels[idx])
    }

    /// Iterate over every pixel with its position.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel<Rgb888>> + '_ {
        let width = self.size.width as usize;
        self.pixels
            .iter()
            .enumerate()
            .map(move |(idx, color)| Pixel(Point::new((idx % width) as i32, (idx / width) as i32), *color))
    }

    /// Number of pixels currently set to `color`.
    pub fn count(
        &self,
        color: Rgb888,
    ) -> usize {
        self.pixels.iter().filter(|px| **px == color).count()
    }

    /// True when every pixel is black.
    pub fn is_blank(&self) -> bool { self.pixels.iter().all(|px| *px == BLACK) }

    fn index_of(
        &self,
        point: Point,
    ) -> Option<usize> {
        let in_bounds = point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.size.width
            && (point.y as u32) < self.size.height;
        in_bounds.then(|| point.y as usize * self.size.width as usize + point.x as usize)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size { self.size }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Off-panel pixels are clipped
            if let Some(idx) = self.index_of(point) {
                self.pixels[idx] = color;
            }
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}
