//! FILENAME: core/report-view/src/paginator.rs
//! Page arithmetic over an already-evaluated result set.

use crate::error::ViewError;
use serde::Serialize;

/// Computes page bounds over `count` rows, `per_page` at a time.
/// An empty result set still has one (empty) first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginator {
    pub count: usize,
    pub per_page: usize,
}

/// The half-open row range of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageBounds {
    pub number: usize,
    pub start: usize,
    pub end: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Paginator { count, per_page }
    }

    pub fn num_pages(&self) -> usize {
        if self.count == 0 || self.per_page == 0 {
            return 1;
        }
        self.count.div_ceil(self.per_page)
    }

    /// Bounds of the 1-based page `number`. Out of range is an error,
    /// not a clamp: malformed pagination input stays visible.
    pub fn page(&self, number: usize) -> Result<PageBounds, ViewError> {
        let num_pages = self.num_pages();
        if number == 0 || number > num_pages {
            return Err(ViewError::InvalidPage {
                page: number,
                num_pages,
            });
        }
        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.count);
        Ok(PageBounds {
            number,
            start,
            end,
        })
    }
}
