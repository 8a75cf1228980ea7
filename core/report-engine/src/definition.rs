//! FILENAME: core/report-engine/src/definition.rs
//! Report Configuration - display metadata attached to an aggregation.
//!
//! These types describe WHAT a report shows: the ordered output columns,
//! per-field formatting and alignment, totals behavior and pagination
//! thresholds. They carry no result data themselves.

use crate::totals::Aggregation;
use crate::value::{Record, Value};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The validated parameter bag handed to `aggregate()`.
pub type Params = IndexMap<String, Value>;

// ============================================================================
// FIELDS
// ============================================================================

/// One output column: a lookup key plus its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
}

impl FieldDescriptor {
    pub fn new(name: &str, label: &str) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            label: label.to_string(),
        }
    }

    /// Derives the label from the name: underscores split words, each
    /// word is title-cased ("unit_price" -> "Unit Price").
    pub fn from_name(name: &str) -> Self {
        let label = name
            .split('_')
            .filter(|s| !s.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        FieldDescriptor {
            name: name.to_string(),
            label,
        }
    }
}

// ============================================================================
// FORMATTING AND ALIGNMENT
// ============================================================================

/// Raised by a formatting function that cannot handle a particular value.
/// The engine swallows this per cell and keeps the raw value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot format value: {0}")]
pub struct FormatError(pub String);

/// Per-field display formatter applied to raw data values.
pub type FormatFn = fn(&Value) -> Result<Value, FormatError>;

/// Horizontal alignment tag for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Left
    }
}

impl Alignment {
    pub fn css_class(self) -> &'static str {
        match self {
            Alignment::Left => "align-left",
            Alignment::Center => "align-center",
            Alignment::Right => "align-right",
        }
    }
}

// ============================================================================
// COMPUTED COLUMNS
// ============================================================================

/// A per-row virtual column resolved from the whole record instead of a
/// single data key. A computed column shadows a same-named data column
/// and is never sortable (it cannot be pushed down to the data source).
#[derive(Debug, Clone)]
pub struct ComputedColumn {
    pub name: String,
    pub func: fn(&Record) -> Value,
    /// When set, the output is pre-escaped markup and must skip further
    /// escaping downstream.
    pub allow_tags: bool,
}

impl ComputedColumn {
    pub fn new(name: &str, func: fn(&Record) -> Value) -> Self {
        ComputedColumn {
            name: name.to_string(),
            func,
            allow_tags: false,
        }
    }

    pub fn with_tags(name: &str, func: fn(&Record) -> Value) -> Self {
        ComputedColumn {
            name: name.to_string(),
            func,
            allow_tags: true,
        }
    }
}

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// The complete display configuration of a report.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Ordered output columns; `None` infers them from the dataset.
    pub fields: Option<Vec<FieldDescriptor>>,

    /// Per-field display formatters.
    pub formatting: FxHashMap<String, FormatFn>,

    /// Per-field alignment tags; unlisted fields align left.
    pub alignment: FxHashMap<String, Alignment>,

    /// Whether the report carries a totals row.
    pub has_totals: bool,

    /// Render the totals row above the results instead of below.
    pub totals_on_top: bool,

    /// Per-field aggregators computing the totals row from full columns.
    /// When set, the positional last-row split is not used.
    pub auto_totals: Option<FxHashMap<String, Aggregation>>,

    /// Display title; `None` derives it from the report's type name.
    pub title: Option<String>,

    pub description: String,

    pub help_text: String,

    /// Rows per page.
    pub list_per_page: usize,

    /// Ceiling above which "show all" is refused.
    pub list_max_show_all: usize,

    /// Default parameters used until the caller supplies its own.
    pub initial: Params,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            fields: None,
            formatting: FxHashMap::default(),
            alignment: FxHashMap::default(),
            has_totals: false,
            totals_on_top: false,
            auto_totals: None,
            title: None,
            description: String::new(),
            help_text: String::new(),
            list_per_page: 100,
            list_max_show_all: 200,
            initial: Params::default(),
        }
    }
}

impl ReportConfig {
    /// Convenience for configuring fields from bare names.
    pub fn with_field_names<'a, I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.fields = Some(names.into_iter().map(FieldDescriptor::from_name).collect());
        self
    }
}
