//! FILENAME: core/report-view/src/error.rs

use report_engine::ReportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    /// Malformed pagination input; the surrounding view layer turns this
    /// into a user-facing 4xx response. Never clamped silently.
    #[error("invalid page number {page}: must be between 1 and {num_pages}")]
    InvalidPage { page: usize, num_pages: usize },

    #[error(transparent)]
    Report(#[from] ReportError),
}
