//! FILENAME: core/report-engine/src/datasource.rs
//! The three raw dataset shapes behind one capability surface.
//!
//! A report's `aggregate()` may return a deferred query handle, a
//! column-oriented frame, or a plain sequence of row mappings. The
//! `DataSource` enum exposes counting, multi-key sorting, totals-row
//! splitting, field-name inference and row normalization uniformly, so
//! the evaluation engine never branches on the concrete shape.

use crate::error::ReportError;
use crate::value::{compare_values, Record, Value};
use serde::{Deserialize, Serialize};

// ============================================================================
// SORT KEYS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

impl SortDirection {
    pub fn is_ascending(self) -> bool {
        matches!(self, SortDirection::Ascending)
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// One sort criterion: a field name plus a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortDirection::Descending,
        }
    }

    /// Parses the string form: a leading `-` means descending.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(rest) => SortKey::descending(rest),
            None => SortKey::ascending(raw),
        }
    }

    /// The string form understood by [`SortKey::parse`].
    pub fn to_param(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.field.clone(),
            SortDirection::Descending => format!("-{}", self.field),
        }
    }
}

// ============================================================================
// QUERY SOURCE (deferred relational handle)
// ============================================================================

/// Minimal capability contract for a deferred relational result set.
///
/// The query engine stays opaque: the report only needs counting, column
/// names, server-side multi-key ordering and final materialization.
pub trait QuerySource: Send {
    /// Number of rows without materializing them.
    fn count(&self) -> Result<usize, ReportError>;

    /// Column names in the result set's natural order.
    fn field_names(&self) -> Result<Vec<String>, ReportError>;

    /// Pushes a multi-key ordering down to the query engine.
    fn order_by(&mut self, keys: &[SortKey]);

    /// Materializes the result set as row mappings.
    fn fetch(&self) -> Result<Vec<Record>, ReportError>;
}

// ============================================================================
// FRAME (column-oriented table)
// ============================================================================

/// A column-oriented table with named columns, supporting vectorized sort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    /// Column-major storage: `data[c][r]` is row `r` of column `c`.
    data: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let data = vec![Vec::new(); columns.len()];
        Frame { columns, data }
    }

    /// Appends one row. Missing trailing cells are filled with `Empty`.
    pub fn push_row<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut cells = row.into_iter();
        for column in self.data.iter_mut() {
            column.push(cells.next().unwrap_or(Value::Empty));
        }
    }

    pub fn row_count(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sorts rows by the named columns with per-column direction flags,
    /// then reindexes every column by the resulting permutation.
    pub fn sort_by(&mut self, keys: &[SortKey]) {
        let resolved: Vec<(usize, SortDirection)> = keys
            .iter()
            .filter_map(|k| self.column_index(&k.field).map(|i| (i, k.direction)))
            .collect();
        if resolved.is_empty() {
            return;
        }
        let mut order: Vec<usize> = (0..self.row_count()).collect();
        order.sort_by(|&a, &b| {
            for &(col, direction) in &resolved {
                let ord = compare_values(&self.data[col][a], &self.data[col][b]);
                let ord = if direction.is_ascending() {
                    ord
                } else {
                    ord.reverse()
                };
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });
        for column in self.data.iter_mut() {
            *column = order.iter().map(|&r| column[r].clone()).collect();
        }
    }

    fn row(&self, index: usize) -> Record {
        self.columns
            .iter()
            .zip(self.data.iter())
            .map(|(name, column)| (name.clone(), column[index].clone()))
            .collect()
    }

    pub fn to_records(&self) -> Vec<Record> {
        (0..self.row_count()).map(|r| self.row(r)).collect()
    }

    /// Removes and returns the last row, if any.
    pub fn drop_last_row(&mut self) -> Option<Record> {
        let count = self.row_count();
        if count == 0 {
            return None;
        }
        let last = self.row(count - 1);
        for column in self.data.iter_mut() {
            column.pop();
        }
        Some(last)
    }
}

// ============================================================================
// DATA SOURCE
// ============================================================================

/// A raw aggregation result in one of the three supported shapes.
pub enum DataSource {
    /// Deferred relational result set; sorting is pushed to the engine.
    Query(Box<dyn QuerySource>),
    /// Column-oriented frame; sorting is vectorized.
    Frame(Frame),
    /// Plain sequence of row mappings; sorting is repeated stable passes.
    Records(Vec<Record>),
}

impl DataSource {
    pub fn from_query<Q: QuerySource + 'static>(query: Q) -> Self {
        DataSource::Query(Box::new(query))
    }

    pub fn len(&self) -> Result<usize, ReportError> {
        match self {
            DataSource::Query(q) => q.count(),
            DataSource::Frame(f) => Ok(f.row_count()),
            DataSource::Records(r) => Ok(r.len()),
        }
    }

    pub fn is_empty(&self) -> Result<bool, ReportError> {
        Ok(self.len()? == 0)
    }

    /// Column names in the dataset's natural order. A sequence infers them
    /// from the keys of its first row; an empty sequence has none.
    pub fn field_names(&self) -> Result<Vec<String>, ReportError> {
        match self {
            DataSource::Query(q) => q.field_names(),
            DataSource::Frame(f) => Ok(f.column_names().to_vec()),
            DataSource::Records(rows) => Ok(rows
                .first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default()),
        }
    }

    /// Applies a multi-key ordering to the working result set.
    ///
    /// For a plain sequence this is the repeated single-key stable sort:
    /// keys are applied from least- to most-significant so the first key
    /// dominates and ties preserve input order.
    pub fn sort_by(&mut self, keys: &[SortKey]) {
        match self {
            DataSource::Query(q) => q.order_by(keys),
            DataSource::Frame(f) => f.sort_by(keys),
            DataSource::Records(rows) => {
                for key in keys.iter().rev() {
                    rows.sort_by(|a, b| {
                        let ord = compare_values(
                            a.get(&key.field).unwrap_or(&Value::EMPTY),
                            b.get(&key.field).unwrap_or(&Value::EMPTY),
                        );
                        if key.direction.is_ascending() {
                            ord
                        } else {
                            ord.reverse()
                        }
                    });
                }
            }
        }
    }

    /// Splits off the last row in natural order (the positional totals
    /// convention). A deferred query is materialized in place, since a
    /// sliced result set can no longer be reordered server-side.
    pub fn split_last(&mut self) -> Result<Option<Record>, ReportError> {
        match self {
            DataSource::Query(q) => {
                let mut rows = q.fetch()?;
                let last = rows.pop();
                *self = DataSource::Records(rows);
                Ok(last)
            }
            DataSource::Frame(f) => Ok(f.drop_last_row()),
            DataSource::Records(rows) => Ok(rows.pop()),
        }
    }

    /// Normalizes the working result set to row-mapping form.
    pub fn to_records(&self) -> Result<Vec<Record>, ReportError> {
        match self {
            DataSource::Query(q) => q.fetch(),
            DataSource::Frame(f) => Ok(f.to_records()),
            DataSource::Records(rows) => Ok(rows.clone()),
        }
    }
}

impl From<Frame> for DataSource {
    fn from(frame: Frame) -> Self {
        DataSource::Frame(frame)
    }
}

impl From<Vec<Record>> for DataSource {
    fn from(rows: Vec<Record>) -> Self {
        DataSource::Records(rows)
    }
}
