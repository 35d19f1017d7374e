//! Selection and paging arithmetic for the catalog menu.
//!
//! `page_index` is always derived from `current_index`; it is never moved on
//! its own, so the page shown and the highlighted entry cannot drift apart.

use core::ops::Range;

/// A directional menu move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Navigation {
    /// Previous entry, wrapping to the last.
    Up,
    /// Next entry, wrapping to the first.
    Down,
    /// First entry of the previous page.
    Left,
    /// First entry of the next page.
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MenuState {
    current_index: usize,
    page_index: usize,
    items_per_page: usize,
}

impl MenuState {
    /// Start at the first entry. `items_per_page` is raised to at least 1.
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_index: 0,
            page_index: 0,
            items_per_page: items_per_page.max(1),
        }
    }

    /// Index of the selected catalog entry.
    pub const fn current_index(&self) -> usize { self.current_index }

    /// Page holding the selected entry.
    pub const fn page_index(&self) -> usize { self.page_index }

    /// Entries per menu page.
    pub const fn items_per_page(&self) -> usize { self.items_per_page }

    /// Apply `nav` to a catalog of `len` entries. No-op on an empty catalog.
    pub fn navigate(
        &mut self,
        nav: Navigation,
        len: usize,
    ) {
        if len == 0 {
            return;
        }
        match nav {
            Navigation::Up => self.current_index = (self.current_index + len - 1) % len,
            Navigation::Down => self.current_index = (self.current_index + 1) % len,
            Navigation::Left => {
                if self.page_index > 0 {
                    self.current_index = (self.page_index - 1) * self.items_per_page;
                }
            }
            Navigation::Right => {
                if (self.page_index + 1) * self.items_per_page < len {
                    self.current_index = (self.page_index + 1) * self.items_per_page;
                }
            }
        }
        self.page_index = self.current_index / self.items_per_page;
    }

    /// Catalog indices shown on the current page.
    pub fn page_range(
        &self,
        len: usize,
    ) -> Range<usize> {
        let start = (self.page_index * self.items_per_page).min(len);
        start..(start + self.items_per_page).min(len)
    }

    /// Number of pages for `len` entries. An empty catalog still has one page.
    pub const fn total_pages(
        &self,
        len: usize,
    ) -> usize {
        if len == 0 { 1 } else { len.div_ceil(self.items_per_page) }
    }
}
