//! FILENAME: core/report-engine/src/lib.rs
//! Report subsystem - aggregation and presentation of tabular results.
//!
//! This crate turns a raw aggregated dataset (a deferred query handle, a
//! column-oriented frame, or a plain sequence of row mappings) into a
//! uniform, sortable, totals-aware result set ready for display or export.
//!
//! Layers:
//! - `value`: The cell scalar and row-mapping types
//! - `datasource`: The three dataset shapes behind one capability surface
//! - `definition`: Report configuration (what the report IS)
//! - `report`: Lazy evaluation engine (HOW results are produced)
//! - `totals`: Aggregators for computed totals rows
//! - `export`: CSV serialization
//! - `registry`: Process-wide report registration and URL derivation

pub mod datasource;
pub mod definition;
pub mod error;
pub mod export;
pub mod registry;
pub mod report;
pub mod totals;
pub mod value;

pub use datasource::{DataSource, Frame, QuerySource, SortDirection, SortKey};
pub use definition::{
    Alignment, ComputedColumn, FieldDescriptor, FormatError, FormatFn, Params, ReportConfig,
};
pub use error::ReportError;
pub use export::{CsvOptions, CsvWriter, Quoting};
pub use registry::{ReportEntry, ReportRegistry, ReportUrl};
pub use report::{Cell, Principal, Report, ReportSource};
pub use totals::Aggregation;
pub use value::{record, Record, Value};
