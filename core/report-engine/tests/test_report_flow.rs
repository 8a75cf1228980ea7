//! FILENAME: core/report-engine/tests/test_report_flow.rs
//! End-to-end checks over the three dataset shapes: evaluation laws,
//! sorting, totals, field ordering and CSV export.

use report_engine::{
    record, Aggregation, CsvOptions, DataSource, Frame, Params, Quoting, QuerySource, Record,
    Report, ReportConfig, ReportError, ReportSource, SortKey, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ----------------------------------------------------------------------
// A deferred query handle that counts fetches and honors order pushdown.
// ----------------------------------------------------------------------

struct FakeQuery {
    rows: Vec<Record>,
    order: Vec<SortKey>,
    fetches: Arc<AtomicUsize>,
}

impl FakeQuery {
    fn new(rows: Vec<Record>, fetches: Arc<AtomicUsize>) -> Self {
        FakeQuery {
            rows,
            order: Vec::new(),
            fetches,
        }
    }
}

impl QuerySource for FakeQuery {
    fn count(&self) -> Result<usize, ReportError> {
        Ok(self.rows.len())
    }

    fn field_names(&self) -> Result<Vec<String>, ReportError> {
        Ok(self
            .rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn order_by(&mut self, keys: &[SortKey]) {
        self.order = keys.to_vec();
    }

    fn fetch(&self) -> Result<Vec<Record>, ReportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.clone();
        for key in self.order.iter().rev() {
            rows.sort_by(|a, b| {
                let ord = report_engine::value::compare_values(
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
        Ok(rows)
    }
}

fn sample_rows() -> Vec<Record> {
    vec![
        record([("a", Value::from(3)), ("b", Value::from("x"))]),
        record([("a", Value::from(1)), ("b", Value::from("y"))]),
        record([("a", Value::from(2)), ("b", Value::from("z"))]),
    ]
}

struct QueryReport {
    fetches: Arc<AtomicUsize>,
}

impl ReportSource for QueryReport {
    fn aggregate(&self, _params: &Params) -> Result<DataSource, ReportError> {
        Ok(DataSource::from_query(FakeQuery::new(
            sample_rows(),
            self.fetches.clone(),
        )))
    }
}

struct FrameReport;

impl ReportSource for FrameReport {
    fn aggregate(&self, _params: &Params) -> Result<DataSource, ReportError> {
        let mut frame = Frame::new(["a", "b"]);
        frame.push_row([Value::from(3), Value::from("x")]);
        frame.push_row([Value::from(1), Value::from("y")]);
        frame.push_row([Value::from(2), Value::from("z")]);
        Ok(frame.into())
    }
}

struct RowsReport;

impl ReportSource for RowsReport {
    fn aggregate(&self, _params: &Params) -> Result<DataSource, ReportError> {
        Ok(sample_rows().into())
    }
}

// ----------------------------------------------------------------------
// Uniform behavior across the three shapes
// ----------------------------------------------------------------------

fn assert_sorted_ascending(report: &mut Report) {
    report.set_sort_params(["a"]);
    let rows = report.get_results().unwrap();
    let order: Vec<String> = rows.iter().map(|r| r["a"].display()).collect();
    assert_eq!(order, ["1", "2", "3"]);
}

#[test]
fn test_sort_uniform_across_shapes() {
    let fetches = Arc::new(AtomicUsize::new(0));
    assert_sorted_ascending(&mut Report::new(QueryReport {
        fetches: fetches.clone(),
    }));
    assert_sorted_ascending(&mut Report::new(FrameReport));
    assert_sorted_ascending(&mut Report::new(RowsReport));
}

#[test]
fn test_field_order_matches_get_fields() {
    for mut report in [
        Report::new(FrameReport),
        Report::new(RowsReport),
    ] {
        let fields: Vec<String> = report
            .get_fields()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        for row in report.get_results().unwrap() {
            let keys: Vec<String> = row.keys().cloned().collect();
            assert_eq!(keys, fields);
        }
    }
}

#[test]
fn test_get_results_is_idempotent() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut report = Report::new(QueryReport {
        fetches: fetches.clone(),
    });
    report.set_sort_params(["-a"]);
    let first: Vec<Record> = report.get_results().unwrap().to_vec();
    let second: Vec<Record> = report.get_results().unwrap().to_vec();
    assert_eq!(first, second);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sort_change_invalidates_only_sort() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut report = Report::new(QueryReport {
        fetches: fetches.clone(),
    });
    report.set_sort_params(["a"]);
    report.get_results().unwrap();
    report.set_sort_params(["-a"]);
    let rows = report.get_results().unwrap();
    assert_eq!(rows[0]["a"], Value::Number(3.0));
    // Re-sorting re-fetches the deferred query but never re-aggregates.
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

// ----------------------------------------------------------------------
// Totals
// ----------------------------------------------------------------------

struct TotalsLastRow;

impl ReportSource for TotalsLastRow {
    fn aggregate(&self, _params: &Params) -> Result<DataSource, ReportError> {
        Ok(vec![
            record([("region", Value::from("north")), ("sales", Value::from(10))]),
            record([("region", Value::from("south")), ("sales", Value::from(30))]),
            record([("region", Value::from("TOTAL")), ("sales", Value::from(40))]),
        ]
        .into())
    }

    fn config(&self) -> ReportConfig {
        ReportConfig {
            has_totals: true,
            ..ReportConfig::default()
        }
    }
}

struct AutoTotals;

impl ReportSource for AutoTotals {
    fn aggregate(&self, _params: &Params) -> Result<DataSource, ReportError> {
        Ok(vec![
            record([("region", Value::from("north")), ("sales", Value::from(10))]),
            record([("region", Value::from("south")), ("sales", Value::from(30))]),
        ]
        .into())
    }

    fn config(&self) -> ReportConfig {
        let mut auto = rustc_hash_table();
        auto.insert("sales".to_string(), Aggregation::Sum);
        ReportConfig {
            has_totals: true,
            auto_totals: Some(auto),
            ..ReportConfig::default()
        }
    }
}

fn rustc_hash_table() -> rustc_hash::FxHashMap<String, Aggregation> {
    rustc_hash::FxHashMap::default()
}

#[test]
fn test_totals_splitting_law() {
    let mut report = Report::new(TotalsLastRow);
    assert_eq!(report.result_count().unwrap(), 2);
    let totals = report.get_totals().unwrap();
    assert_eq!(totals["region"], Value::Text("TOTAL".to_string()));
    assert_eq!(totals["sales"], Value::Number(40.0));
}

#[test]
fn test_auto_totals_keeps_all_rows() {
    let mut report = Report::new(AutoTotals);
    assert_eq!(report.result_count().unwrap(), 2);
    let totals = report.get_totals().unwrap();
    assert_eq!(totals["sales"], Value::Number(40.0));
    assert_eq!(totals["region"], Value::Empty);
}

// ----------------------------------------------------------------------
// CSV export
// ----------------------------------------------------------------------

/// Minimal CSV reader for round-trip checks: handles quoted fields with
/// doubled quote characters.
fn parse_csv(text: &str, delimiter: char, quote: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for line in text.split("\r\n").filter(|l| !l.is_empty()) {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if in_quotes {
                if c == quote {
                    if chars.peek() == Some(&quote) {
                        field.push(quote);
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    field.push(c);
                }
            } else if c == quote {
                in_quotes = true;
            } else if c == delimiter {
                fields.push(std::mem::take(&mut field));
            } else {
                field.push(c);
            }
        }
        fields.push(field);
        rows.push(fields);
    }
    rows
}

#[test]
fn test_csv_round_trip_with_header_and_totals() {
    let mut report = Report::new(TotalsLastRow);
    let options = CsvOptions {
        header: true,
        totals: true,
        delimiter: ';',
        quotechar: '"',
        quoting: Quoting::All,
        escapechar: None,
        extra_rows: None,
    };
    options.validate().unwrap();
    let mut buf = Vec::new();
    report.to_csv(&mut buf, &options).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let rows = parse_csv(&text, ';', '"');
    assert_eq!(rows[0], ["Region", "Sales"]);
    assert_eq!(rows[1], ["north", "10"]);
    assert_eq!(rows[2], ["south", "30"]);
    assert_eq!(rows[3], ["TOTAL", "40"]);
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_csv_header_quote_all_example() {
    struct TwoFields;
    impl ReportSource for TwoFields {
        fn aggregate(&self, _params: &Params) -> Result<DataSource, ReportError> {
            Ok(vec![record([("a", Value::from(1)), ("b", Value::from("v"))])].into())
        }
        fn config(&self) -> ReportConfig {
            ReportConfig {
                fields: Some(vec![
                    report_engine::FieldDescriptor::new("a", "A"),
                    report_engine::FieldDescriptor::new("b", "B"),
                ]),
                ..ReportConfig::default()
            }
        }
    }
    let mut report = Report::new(TwoFields);
    let options = CsvOptions {
        quoting: Quoting::All,
        totals: false,
        ..CsvOptions::default()
    };
    let mut buf = Vec::new();
    report.to_csv(&mut buf, &options).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.split("\r\n");
    assert_eq!(lines.next(), Some("\"A\";\"B\""));
    assert_eq!(lines.next(), Some("\"1\";\"v\""));
}

#[test]
fn test_csv_extra_rows_preamble() {
    let mut report = Report::new(RowsReport);
    let options = CsvOptions {
        header: false,
        totals: false,
        quoting: Quoting::Minimal,
        extra_rows: Some(vec![vec!["generated".to_string(), "today".to_string()]]),
        ..CsvOptions::default()
    };
    let mut buf = Vec::new();
    report.to_csv(&mut buf, &options).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("generated;today\r\n"));
}
