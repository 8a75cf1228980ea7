//! FILENAME: core/report-engine/src/report.rs
//! Report Engine - lazy evaluation of an aggregation into display rows.
//!
//! A `Report` wraps a `ReportSource` (the developer-defined aggregation)
//! and memoizes its evaluation: `aggregate()` runs at most once per
//! parameter set, the sort is applied at most once per sort-spec change,
//! and the normalized row cache makes repeated reads idempotent.

use crate::datasource::{DataSource, SortKey};
use crate::definition::{Alignment, ComputedColumn, FieldDescriptor, Params, ReportConfig};
use crate::error::ReportError;
use crate::export::{CsvOptions, CsvWriter};
use crate::registry::camel_to_title;
use crate::totals;
use crate::value::{Record, Value};
use log::debug;
use serde::Serialize;
use smallvec::SmallVec;
use std::io::Write;

// ============================================================================
// COLLABORATOR CONTRACTS
// ============================================================================

/// The principal viewing a report; only the two admin flags matter here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub is_active: bool,
    pub is_staff: bool,
}

/// A developer-defined report: an aggregation plus display metadata.
///
/// Implementations override `aggregate` to produce the raw dataset in
/// one of the three supported shapes. When the positional totals split
/// is in use (`has_totals` without `auto_totals`), the aggregation must
/// append the totals row last in its natural order; the split happens
/// at evaluation time, before any sort.
pub trait ReportSource: Send {
    /// Produces the raw dataset for the given parameters.
    ///
    /// Leaving this unimplemented is a contract violation: the default
    /// body fails with [`ReportError::AggregateNotImplemented`].
    fn aggregate(&self, params: &Params) -> Result<DataSource, ReportError> {
        let _ = params;
        Err(ReportError::AggregateNotImplemented)
    }

    /// Display configuration for this report.
    fn config(&self) -> ReportConfig {
        ReportConfig::default()
    }

    /// Per-field resolver table for virtual columns. A computed column
    /// shadows a same-named data column.
    fn computed_columns(&self) -> Vec<ComputedColumn> {
        Vec::new()
    }

    /// Whether the principal may view this report.
    fn has_permission(&self, principal: &Principal) -> bool {
        principal.is_active && principal.is_staff
    }
}

// ============================================================================
// RESOLVED CELLS
// ============================================================================

/// One resolved output cell. `safe` marks pre-escaped markup from a
/// computed column flagged `allow_tags`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: Value,
    pub safe: bool,
}

impl Cell {
    pub fn plain(value: Value) -> Self {
        Cell { value, safe: false }
    }
}

// ============================================================================
// EVALUATION STATE
// ============================================================================

/// Memoization state. Only `reset`, `set_params` and `set_sort_params`
/// transition backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvalState {
    Unevaluated,
    Evaluated,
    Sorted,
}

// ============================================================================
// REPORT
// ============================================================================

/// One report instance, constructed fresh per request.
pub struct Report {
    source: Box<dyn ReportSource>,
    type_name: String,
    config: ReportConfig,
    computed: Vec<ComputedColumn>,
    params: Params,
    sort_keys: SmallVec<[SortKey; 4]>,
    state: EvalState,
    data: Option<DataSource>,
    rows: Option<Vec<Record>>,
    totals: Option<Record>,
    totals_done: bool,
}

impl Report {
    pub fn new<S: ReportSource + 'static>(source: S) -> Self {
        let type_name = std::any::type_name::<S>()
            .rsplit("::")
            .next()
            .unwrap_or("Report")
            .to_string();
        let config = source.config();
        let computed = source.computed_columns();
        let params = config.initial.clone();
        Report {
            source: Box::new(source),
            type_name,
            config,
            computed,
            params,
            sort_keys: SmallVec::new(),
            state: EvalState::Unevaluated,
            data: None,
            rows: None,
            totals: None,
            totals_done: false,
        }
    }

    // ------------------------------------------------------------------
    // Parameters and sort spec
    // ------------------------------------------------------------------

    /// Replaces the parameter set and invalidates the cached evaluation.
    /// No I/O happens until results are next read.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
        self.invalidate();
    }

    pub fn get_params(&self) -> &Params {
        &self.params
    }

    /// Replaces the sort spec (string form: leading `-` = descending).
    /// Invalidates only the cached sort, not the aggregation.
    pub fn set_sort_params<I, S>(&mut self, params: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sort_keys = params
            .into_iter()
            .map(|p| SortKey::parse(p.as_ref()))
            .collect();
        if self.state == EvalState::Sorted {
            self.state = EvalState::Evaluated;
        }
        self.rows = None;
    }

    pub fn get_sort_params(&self) -> Vec<String> {
        self.sort_keys.iter().map(SortKey::to_param).collect()
    }

    /// Drops every cached result; the next read re-aggregates.
    pub fn reset(&mut self) {
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.state = EvalState::Unevaluated;
        self.data = None;
        self.rows = None;
        self.totals = None;
        self.totals_done = false;
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Runs the aggregation once and splits the positional totals row.
    fn eval(&mut self) -> Result<(), ReportError> {
        if self.state != EvalState::Unevaluated {
            return Ok(());
        }
        debug!("evaluating report {}", self.type_name);
        let mut data = self.source.aggregate(&self.params)?;
        if self.config.has_totals && self.config.auto_totals.is_none() && !data.is_empty()? {
            self.totals = data.split_last()?;
        } else {
            self.totals = None;
        }
        self.data = Some(data);
        self.totals_done = false;
        self.state = EvalState::Evaluated;
        Ok(())
    }

    /// Applies the sort spec once and normalizes rows to mapping form.
    fn ensure_sorted(&mut self) -> Result<(), ReportError> {
        self.eval()?;
        if self.state == EvalState::Sorted {
            return Ok(());
        }
        if !self.sort_keys.is_empty() {
            debug!(
                "sorting report {} by {:?}",
                self.type_name,
                self.sort_keys.iter().map(SortKey::to_param).collect::<Vec<_>>()
            );
        }
        if let Some(data) = self.data.as_mut() {
            if !self.sort_keys.is_empty() {
                data.sort_by(&self.sort_keys);
            }
            self.rows = Some(data.to_records()?);
        } else {
            self.rows = Some(Vec::new());
        }
        self.state = EvalState::Sorted;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Result access
    // ------------------------------------------------------------------

    /// Number of result rows (totals row excluded).
    pub fn result_count(&mut self) -> Result<usize, ReportError> {
        self.eval()?;
        if let Some(rows) = &self.rows {
            return Ok(rows.len());
        }
        match &self.data {
            Some(data) => data.len(),
            None => Ok(0),
        }
    }

    /// The ordered output columns: configured fields verbatim, or the
    /// dataset's natural column order.
    pub fn get_fields(&mut self) -> Result<Vec<FieldDescriptor>, ReportError> {
        if let Some(fields) = &self.config.fields {
            return Ok(fields.clone());
        }
        self.eval()?;
        let names = if let Some(rows) = &self.rows {
            rows.first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default()
        } else {
            match &self.data {
                Some(data) => data.field_names()?,
                None => Vec::new(),
            }
        };
        Ok(names.iter().map(|n| FieldDescriptor::from_name(n)).collect())
    }

    /// The evaluated, sorted result rows in mapping form. Field order of
    /// every row matches `get_fields()`'s source ordering.
    pub fn get_results(&mut self) -> Result<&[Record], ReportError> {
        self.ensure_sorted()?;
        Ok(self.rows.as_deref().unwrap_or(&[]))
    }

    /// The totals row. Computes auto-totals lazily on first access;
    /// totals are never re-sorted or paginated.
    pub fn get_totals(&mut self) -> Result<Record, ReportError> {
        if !self.config.has_totals {
            return Ok(Record::default());
        }
        self.eval()?;
        if !self.totals_done {
            if let Some(table) = self.config.auto_totals.clone() {
                let fields = self.get_fields()?;
                let computed = {
                    let rows = self.get_results()?;
                    totals::compute_auto_totals(&fields, rows, &table)
                };
                self.totals = Some(computed);
            }
            self.totals_done = true;
        }
        Ok(self.totals.clone().unwrap_or_default())
    }

    pub fn get_alignment(&self, field: &str) -> Alignment {
        self.config
            .alignment
            .get(field)
            .copied()
            .unwrap_or_default()
    }

    /// Whether the field resolves to a computed column.
    pub fn is_computed(&self, field: &str) -> bool {
        self.computed.iter().any(|c| c.name == field)
    }

    // ------------------------------------------------------------------
    // Cell resolution
    // ------------------------------------------------------------------

    /// Two-tier resolution: a computed column shadows the data key; a
    /// data lookup applies the configured formatter, falling back to the
    /// raw value when the formatter rejects this particular cell.
    fn resolve_cell(&self, field: &str, row: &Record) -> Cell {
        if let Some(column) = self.computed.iter().find(|c| c.name == field) {
            return Cell {
                value: (column.func)(row),
                safe: column.allow_tags,
            };
        }
        let raw = row.get(field).cloned().unwrap_or(Value::Empty);
        let value = match self.config.formatting.get(field) {
            Some(format) => format(&raw).unwrap_or(raw),
            None => raw,
        };
        Cell::plain(value)
    }

    fn resolve_row(&self, fields: &[FieldDescriptor], row: &Record) -> Vec<Cell> {
        fields
            .iter()
            .map(|f| self.resolve_cell(&f.name, row))
            .collect()
    }

    /// Every result row resolved field-by-field into display cells.
    pub fn results(&mut self) -> Result<Vec<Vec<Cell>>, ReportError> {
        let fields = self.get_fields()?;
        self.ensure_sorted()?;
        let rows = self.rows.as_deref().unwrap_or(&[]);
        Ok(rows.iter().map(|r| self.resolve_row(&fields, r)).collect())
    }

    /// The totals row resolved into display cells.
    pub fn totals_row(&mut self) -> Result<Vec<Cell>, ReportError> {
        let fields = self.get_fields()?;
        let totals = self.get_totals()?;
        Ok(self.resolve_row(&fields, &totals))
    }

    /// Replaces the sort spec and returns the resolved rows.
    pub fn sort<I, S>(&mut self, params: I) -> Result<Vec<Vec<Cell>>, ReportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_sort_params(params);
        self.results()
    }

    // ------------------------------------------------------------------
    // CSV export
    // ------------------------------------------------------------------

    /// Writes the report as CSV: optional preamble rows, optional label
    /// header, one row per result, optional trailing totals row.
    ///
    /// `options` is applied as received; validation against the export
    /// whitelist belongs to the surrounding form layer
    /// ([`CsvOptions::validate`]).
    pub fn to_csv<W: Write>(&mut self, out: &mut W, options: &CsvOptions) -> Result<(), ReportError> {
        debug!("exporting report {} to CSV", self.type_name);
        let fields = self.get_fields()?;
        let mut writer = CsvWriter::new(out, options);
        if let Some(extra) = &options.extra_rows {
            for row in extra {
                writer.write_strings(row)?;
            }
        }
        if options.header {
            let labels: Vec<String> = fields.iter().map(|f| f.label.clone()).collect();
            writer.write_strings(&labels)?;
        }
        for row in self.results()? {
            writer.write_cells(&row)?;
        }
        if options.totals && self.config.has_totals {
            let totals = self.totals_row()?;
            writer.write_cells(&totals)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Metadata accessors
    // ------------------------------------------------------------------

    /// Display title: configured, or derived from the source type name
    /// ("MyFancyReport" -> "My fancy report").
    pub fn title(&self) -> String {
        match &self.config.title {
            Some(title) => title.clone(),
            None => camel_to_title(&self.type_name),
        }
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    pub fn help_text(&self) -> &str {
        &self.config.help_text
    }

    pub fn has_totals(&self) -> bool {
        self.config.has_totals
    }

    pub fn totals_on_top(&self) -> bool {
        self.config.totals_on_top
    }

    pub fn list_per_page(&self) -> usize {
        self.config.list_per_page
    }

    pub fn list_max_show_all(&self) -> usize {
        self.config.list_max_show_all
    }

    pub fn get_initial(&self) -> &Params {
        &self.config.initial
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn has_permission(&self, principal: &Principal) -> bool {
        self.source.has_permission(principal)
    }
}
