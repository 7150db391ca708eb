//! Page slicing over a fetched result set.
//!
//! Pages are 1-based. [`paginate`] is a pure view over a slice and never
//! clamps; [`Pagination`] holds the session's current page and clamps every
//! change into `[1, total_pages]`.

/// Number of items per page.
pub const PAGE_SIZE: usize = 10;

/// One page worth of items plus the page count of the whole list.
#[derive(Debug, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
}

/// Number of pages needed for `len` items, never less than 1.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Slice `items` for the 1-based `page`.
///
/// Returns an empty slice when `page` is 0, past the last page, or `items`
/// is empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> PageSlice<'_, T> {
    let page_size = page_size.max(1);
    let total = total_pages(items.len(), page_size);
    let slice = match page.checked_sub(1).map(|p| p.saturating_mul(page_size)) {
        Some(start) if start < items.len() => {
            let end = (start + page_size).min(items.len());
            &items[start..end]
        }
        _ => &[],
    };
    PageSlice {
        items: slice,
        total_pages: total,
    }
}

/// Current page of one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Pagination {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Move to `page`, clamped to the pages available for `len` items.
    /// Returns the page actually selected.
    pub fn go_to(&mut self, page: usize, len: usize) -> usize {
        let last = total_pages(len, self.page_size);
        self.current_page = page.clamp(1, last);
        self.current_page
    }

    pub fn next(&mut self, len: usize) -> usize {
        self.go_to(self.current_page.saturating_add(1), len)
    }

    pub fn prev(&mut self, len: usize) -> usize {
        self.go_to(self.current_page.saturating_sub(1), len)
    }

    /// Back to page 1. Called whenever the underlying list is replaced.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Slice `items` at the current page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> PageSlice<'a, T> {
        paginate(items, self.current_page, self.page_size)
    }
}
