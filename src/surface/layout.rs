//! Per-frame text region tracking for overlap detection.
//!
//! Every text draw computes a [`BoundingBox`] and registers it in the
//! [`RegionRegistry`] under a [`RegionKey`] made of its anchor, font and text.
//! A draw whose box overlaps another registered box, or leaves the panel, is
//! rejected and shown as an outline instead. The registry is emptied whenever
//! the surface is cleared.

use std::collections::HashMap;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::font::Font;

/// Axis-aligned box in surface coordinates, half-open on the far edges.
///
/// `x2`/`y2` are one past the last covered pixel, so two boxes that only
/// share an edge do not overlap.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Create a box from two corners, normalizing their order.
    pub fn new(
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    ) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Box of a block of text anchored at `(x, baseline)`.
    pub fn for_text(
        x: i32,
        baseline: i32,
        font: Font,
        lines: &[String],
    ) -> Self {
        let top = baseline - font.baseline() as i32;
        let width = lines.iter().map(|line| font.text_width(line)).max().unwrap_or(0);
        let height = lines.len() as u32 * font.line_height();
        Self::new(x, top, x + width as i32, top + height as i32)
    }

    /// True if both axis projections intersect.
    pub const fn overlaps(
        &self,
        other: &Self,
    ) -> bool {
        !(self.x2 <= other.x1 || self.x1 >= other.x2 || self.y2 <= other.y1 || self.y1 >= other.y2)
    }

    /// True if the box lies fully inside `[0, width] × [0, height]`.
    pub const fn is_within(
        &self,
        width: u32,
        height: u32,
    ) -> bool {
        self.x1 >= 0 && self.y1 >= 0 && self.x2 <= width as i32 && self.y2 <= height as i32
    }

    /// Rectangle covering exactly the pixels of this box.
    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x1, self.y1),
            Size::new((self.x2 - self.x1) as u32, (self.y2 - self.y1) as u32),
        )
    }
}

/// Identity of a text draw call.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RegionKey {
    pub x: i32,
    pub y: i32,
    pub font: Font,
    pub text: String,
}

impl RegionKey {
    /// Identity of a text draw at `(x, y)` in `font`.
    pub fn new(
        x: i32,
        y: i32,
        font: Font,
        text: &str,
    ) -> Self {
        Self {
            x,
            y,
            font,
            text: text.to_owned(),
        }
    }
}

/// A registered draw: its box and the wrapped lines that produced it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Region {
    pub bbox: BoundingBox,
    pub lines: Vec<String>,
}

/// Counters for text layout work since the surface was created.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct LayoutStats {
    /// Boxes computed from scratch (wrap + measure).
    pub computed: u32,
    /// Draws served from an already registered box.
    pub reused: u32,
    /// Draws replaced by the fail-visible outline.
    pub rejected: u32,
}

/// Regions drawn since the last clear.
#[derive(Default, Debug)]
pub struct RegionRegistry {
    regions: HashMap<RegionKey, Region>,
}

impl RegionRegistry {
    /// Empty registry.
    pub fn new() -> Self { Self::default() }

    /// Cached region for `key`.
    pub fn get(
        &self,
        key: &RegionKey,
    ) -> Option<&Region> {
        self.regions.get(key)
    }

    /// Register `region` under `key` for the rest of the frame.
    pub fn insert(
        &mut self,
        key: RegionKey,
        region: Region,
    ) {
        self.regions.insert(key, region);
    }

    /// True if `bbox` overlaps a region registered under any other key.
    pub fn collides(
        &self,
        key: &RegionKey,
        bbox: &BoundingBox,
    ) -> bool {
        self.regions
            .iter()
            .any(|(other_key, region)| other_key != key && region.bbox.overlaps(bbox))
    }

    /// Forget every region. Called when the back buffer is cleared.
    pub fn clear(&mut self) { self.regions.clear(); }

    /// Number of registered regions.
    pub fn len(&self) -> usize { self.regions.len() }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    /// Bounding boxes of every registered region.
    pub fn boxes(&self) -> impl Iterator<Item = &BoundingBox> { self.regions.values().map(|region| &region.bbox) }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // BoundingBox Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_overlap_requires_both_axes() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert!(a.overlaps(&BoundingBox::new(5, 5, 15, 15)), "Corner overlap");
        assert!(!a.overlaps(&BoundingBox::new(5, 20, 15, 30)), "X overlaps, Y does not");
        assert!(!a.overlaps(&BoundingBox::new(20, 5, 30, 15)), "Y overlaps, X does not");
    }

    #[test]
    fn test_shared_edge_is_not_overlap() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert!(!a.overlaps(&BoundingBox::new(10, 0, 20, 10)));
        assert!(!a.overlaps(&BoundingBox::new(0, 10, 10, 20)));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(2, 2, 4, 4);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_new_normalizes_corners() {
        assert_eq!(BoundingBox::new(10, 8, 2, 4), BoundingBox::new(2, 4, 10, 8));
    }

    #[test]
    fn test_within_bounds() {
        assert!(BoundingBox::new(0, 0, 64, 64).is_within(64, 64), "Full panel is in bounds");
        assert!(!BoundingBox::new(-1, 0, 10, 10).is_within(64, 64));
        assert!(!BoundingBox::new(0, 0, 65, 10).is_within(64, 64));
        assert!(!BoundingBox::new(0, 60, 10, 70).is_within(64, 64));
    }

    #[test]
    fn test_text_box_from_baseline() {
        let lines = vec!["abc".to_owned(), "abcdef".to_owned()];
        let bbox = BoundingBox::for_text(1, 10, Font::Small, &lines);
        // FONT_4X6: baseline 4, line height 6, 4px glyphs
        assert_eq!(bbox, BoundingBox::new(1, 6, 25, 18));
    }

    #[test]
    fn test_to_rectangle_size() {
        let rect = BoundingBox::new(2, 3, 12, 9).to_rectangle();
        assert_eq!(rect.top_left, Point::new(2, 3));
        assert_eq!(rect.size, Size::new(10, 6));
    }

    // -------------------------------------------------------------------------
    // Registry Tests
    // -------------------------------------------------------------------------

    fn region(bbox: BoundingBox) -> Region {
        Region {
            bbox,
            lines: Vec::new(),
        }
    }

    #[test]
    fn test_registry_ignores_own_key() {
        let mut registry = RegionRegistry::new();
        let key = RegionKey::new(0, 5, Font::Small, "hi");
        let bbox = BoundingBox::new(0, 0, 8, 6);
        registry.insert(key.clone(), region(bbox));

        assert!(!registry.collides(&key, &bbox), "A region never collides with itself");
        let other = RegionKey::new(1, 5, Font::Small, "hi");
        assert!(registry.collides(&other, &BoundingBox::new(1, 0, 9, 6)));
    }

    #[test]
    fn test_registry_clear() {
        let mut registry = RegionRegistry::new();
        registry.insert(RegionKey::new(0, 0, Font::Small, "a"), region(BoundingBox::new(0, 0, 1, 1)));
        assert_eq!(registry.len(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }
}
