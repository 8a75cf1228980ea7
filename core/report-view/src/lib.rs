//! FILENAME: core/report-view/src/lib.rs
//! Per-request presentation layer over `report-engine`.
//!
//! This crate wraps one evaluated report for one request: it parses the
//! sort query parameter into column ordering, computes header metadata
//! with sort links, paginates the result set and pairs every cell with
//! its alignment tag. It owns no result data; it borrows a `Report` and
//! drives re-sort/re-paginate through the report's public mutators.
//!
//! Layers:
//! - `query`: Control parameters and canonical query-string building
//! - `paginator`: Page arithmetic and out-of-range detection
//! - `view`: The `ReportList` request wrapper

pub mod error;
pub mod paginator;
pub mod query;
pub mod view;

pub use error::ViewError;
pub use paginator::{PageBounds, Paginator};
pub use query::{RequestParams, ALL_VAR, CONTROL_VARS, EXPORT_VAR, ORDER_VAR, PAGE_VAR};
pub use view::{Header, ReportList};
