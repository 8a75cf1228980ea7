//! FILENAME: core/report-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("aggregate() is not implemented for this report")]
    AggregateNotImplemented,

    #[error("the report {0} is already registered")]
    AlreadyRegistered(String),

    #[error("the report {0} is not registered")]
    NotRegistered(String),

    #[error("invalid export option: {0}")]
    InvalidExportOption(String),

    #[error("field contains the delimiter and no quoting or escape character is in effect")]
    UnescapableDelimiter,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data source error: {0}")]
    Source(String),
}
