//! FILENAME: core/report-view/src/view.rs
//! ReportList - the per-request wrapper around one report.
//!
//! Parses the ordering parameter into column positions (the UI refers
//! to stable column indices, not field names), pushes the derived sort
//! params into the report, and exposes headers, paginated rows and
//! totals ready for rendering.

use crate::error::ViewError;
use crate::paginator::Paginator;
use crate::query::{self, RequestParams, ALL_VAR, EXPORT_VAR, ORDER_VAR, PAGE_VAR};
use log::debug;
use report_engine::{Alignment, Cell, Report, SortDirection};
use serde::Serialize;

/// UI metadata for one column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub label: String,
    /// False for computed columns: they cannot be pushed down to the
    /// data source for ordering.
    pub sortable: bool,
    pub sorted: bool,
    pub ascending: bool,
    /// 1-based rank among active sort keys; 0 when unsorted.
    pub sort_priority: usize,
    /// Make this column the primary sort key, demoting the others.
    pub url_primary: String,
    /// Drop this column from the active sort set.
    pub url_remove: String,
    /// Toggle this column's direction in place.
    pub url_toggle: String,
    pub css_classes: Vec<String>,
}

fn make_token(direction: SortDirection, column: usize) -> String {
    match direction {
        SortDirection::Ascending => column.to_string(),
        SortDirection::Descending => format!("-{}", column),
    }
}

/// Parses the dot-separated ordering parameter into an ordered
/// `(column index, direction)` list. Malformed tokens are skipped; a
/// repeated column updates its direction but keeps its first position.
fn parse_ordering(raw: Option<&String>) -> Vec<(usize, SortDirection)> {
    let mut ordering: Vec<(usize, SortDirection)> = Vec::new();
    let Some(raw) = raw else {
        return ordering;
    };
    for token in raw.split('.') {
        let (direction, index) = match token.strip_prefix('-') {
            Some(rest) => (SortDirection::Descending, rest),
            None => (SortDirection::Ascending, token),
        };
        let Ok(index) = index.parse::<usize>() else {
            continue;
        };
        match ordering.iter_mut().find(|(col, _)| *col == index) {
            Some(entry) => entry.1 = direction,
            None => ordering.push((index, direction)),
        }
    }
    ordering
}

/// One report wrapped for one request.
pub struct ReportList<'a> {
    report: &'a mut Report,
    params: RequestParams,
    ordering_columns: Vec<(usize, SortDirection)>,
    /// Zero-based page number from the `p` parameter.
    page_num: usize,
    show_all: bool,
    multi_page: bool,
    can_show_all: bool,
}

impl<'a> ReportList<'a> {
    /// Wraps `report`, translating the ordering parameter into field
    /// sort params and pushing them into the report.
    pub fn new(report: &'a mut Report, params: RequestParams) -> Result<Self, ViewError> {
        let ordering_columns = parse_ordering(params.get(ORDER_VAR));
        let fields = report.get_fields()?;
        let sort_params: Vec<String> = ordering_columns
            .iter()
            .filter_map(|&(col, direction)| {
                fields.get(col).map(|field| match direction {
                    SortDirection::Ascending => field.name.clone(),
                    SortDirection::Descending => format!("-{}", field.name),
                })
            })
            .collect();
        report.set_sort_params(&sort_params);
        let page_num = params
            .get(PAGE_VAR)
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        let show_all = params.contains_key(ALL_VAR);
        Ok(ReportList {
            report,
            params,
            ordering_columns,
            page_num,
            show_all,
            multi_page: false,
            can_show_all: true,
        })
    }

    // ------------------------------------------------------------------
    // Headers
    // ------------------------------------------------------------------

    /// Per-column UI metadata. Clicking an unsorted column makes it the
    /// new primary key and demotes the others; clicking a sorted column
    /// toggles its direction in place.
    pub fn headers(&mut self) -> Result<Vec<Header>, ViewError> {
        let fields = self.report.get_fields()?;
        let mut headers = Vec::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if self.report.is_computed(&field.name) {
                headers.push(Header {
                    label: field.label.clone(),
                    sortable: false,
                    sorted: false,
                    ascending: false,
                    sort_priority: 0,
                    url_primary: String::new(),
                    url_remove: String::new(),
                    url_toggle: String::new(),
                    css_classes: vec![format!("column-{}", field.name)],
                });
                continue;
            }
            let mut css_classes = vec!["sortable".to_string(), format!("column-{}", field.name)];
            let position = self.ordering_columns.iter().position(|(col, _)| *col == i);
            let (sorted, direction, sort_priority) = match position {
                Some(pos) => {
                    let direction = self.ordering_columns[pos].1;
                    css_classes.push(format!(
                        "sorted {}ending",
                        if direction.is_ascending() { "asc" } else { "desc" }
                    ));
                    (true, direction, pos + 1)
                }
                None => (false, SortDirection::Ascending, 0),
            };
            let new_direction = if sorted {
                direction.toggled()
            } else {
                SortDirection::Ascending
            };
            let mut primary: Vec<String> = Vec::new();
            let mut remove: Vec<String> = Vec::new();
            let mut toggle: Vec<String> = Vec::new();
            for &(col, dir) in &self.ordering_columns {
                if col == i {
                    let token = make_token(new_direction, col);
                    primary.insert(0, token.clone());
                    toggle.push(token);
                } else {
                    let token = make_token(dir, col);
                    primary.push(token.clone());
                    toggle.push(token.clone());
                    remove.push(token);
                }
            }
            if !sorted {
                primary.insert(0, make_token(new_direction, i));
            }
            headers.push(Header {
                label: field.label.clone(),
                sortable: true,
                sorted,
                ascending: sorted && direction.is_ascending(),
                sort_priority,
                url_primary: self
                    .get_query_string(&[(ORDER_VAR, Some(primary.join(".").as_str()))], &[]),
                url_remove: self
                    .get_query_string(&[(ORDER_VAR, Some(remove.join(".").as_str()))], &[]),
                url_toggle: self
                    .get_query_string(&[(ORDER_VAR, Some(toggle.join(".").as_str()))], &[]),
                css_classes,
            });
        }
        Ok(headers)
    }

    // ------------------------------------------------------------------
    // Pagination and rows
    // ------------------------------------------------------------------

    /// The rows for this request: everything when "show all" is allowed
    /// or the set fits one page, otherwise exactly one page's worth.
    pub fn paginate(&mut self) -> Result<Vec<Vec<Cell>>, ViewError> {
        let per_page = self.report.list_per_page();
        let max_show_all = self.report.list_max_show_all();
        let rows = self.report.results()?;
        let count = rows.len();
        self.multi_page = count > per_page;
        self.can_show_all = count <= max_show_all;
        if !(self.show_all && self.can_show_all) && self.multi_page {
            let bounds = Paginator::new(count, per_page).page(self.page_num + 1)?;
            debug!(
                "page {} of {} rows ({}..{})",
                bounds.number, count, bounds.start, bounds.end
            );
            return Ok(rows[bounds.start..bounds.end].to_vec());
        }
        Ok(rows)
    }

    /// Paginated rows with each cell paired to its alignment tag.
    pub fn results(&mut self) -> Result<Vec<Vec<(Alignment, Cell)>>, ViewError> {
        let fields = self.report.get_fields()?;
        let rows = self.paginate()?;
        Ok(rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(idx, cell)| {
                        let alignment = fields
                            .get(idx)
                            .map(|f| self.report.get_alignment(&f.name))
                            .unwrap_or_default();
                        (alignment, cell)
                    })
                    .collect()
            })
            .collect())
    }

    /// The totals row with alignment tags. Never paginated.
    pub fn totals(&mut self) -> Result<Vec<(Alignment, Cell)>, ViewError> {
        let fields = self.report.get_fields()?;
        let cells = self.report.totals_row()?;
        Ok(cells
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| {
                let alignment = fields
                    .get(idx)
                    .map(|f| self.report.get_alignment(&f.name))
                    .unwrap_or_default();
                (alignment, cell)
            })
            .collect())
    }

    pub fn result_count(&mut self) -> Result<usize, ViewError> {
        Ok(self.report.result_count()?)
    }

    // ------------------------------------------------------------------
    // Query strings
    // ------------------------------------------------------------------

    /// Canonical query string from the current parameters plus
    /// overrides; see [`query::build_query_string`].
    pub fn get_query_string(
        &self,
        new_params: &[(&str, Option<&str>)],
        remove: &[&str],
    ) -> String {
        query::build_query_string(&self.params, new_params, remove)
    }

    /// Link to the export form for the current view.
    pub fn export_url(&self) -> String {
        self.get_query_string(&[(EXPORT_VAR, Some(""))], &[])
    }

    /// Link back from the export form to the current view.
    pub fn back_url(&self) -> String {
        self.get_query_string(&[(EXPORT_VAR, None)], &[])
    }

    // ------------------------------------------------------------------
    // State accessors
    // ------------------------------------------------------------------

    pub fn multi_page(&self) -> bool {
        self.multi_page
    }

    pub fn can_show_all(&self) -> bool {
        self.can_show_all
    }

    pub fn show_all(&self) -> bool {
        self.show_all
    }

    pub fn page_num(&self) -> usize {
        self.page_num
    }

    pub fn ordering_columns(&self) -> &[(usize, SortDirection)] {
        &self.ordering_columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ordering_tokens() {
        let raw = "-0.2.junk.1".to_string();
        let ordering = parse_ordering(Some(&raw));
        assert_eq!(
            ordering,
            vec![
                (0, SortDirection::Descending),
                (2, SortDirection::Ascending),
                (1, SortDirection::Ascending),
            ]
        );
    }

    #[test]
    fn test_parse_ordering_repeated_column() {
        let raw = "0.1.-0".to_string();
        let ordering = parse_ordering(Some(&raw));
        assert_eq!(
            ordering,
            vec![
                (0, SortDirection::Descending),
                (1, SortDirection::Ascending),
            ]
        );
    }

    #[test]
    fn test_header_serializes_for_templates() {
        let header = Header {
            label: "Sales".to_string(),
            sortable: true,
            sorted: true,
            ascending: false,
            sort_priority: 1,
            url_primary: "?o=0".to_string(),
            url_remove: "?o=".to_string(),
            url_toggle: "?o=-0".to_string(),
            css_classes: vec!["sortable".to_string()],
        };
        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(json["label"], "Sales");
        assert_eq!(json["sort_priority"], 1);
    }

    #[test]
    fn test_make_token() {
        assert_eq!(make_token(SortDirection::Ascending, 3), "3");
        assert_eq!(make_token(SortDirection::Descending, 0), "-0");
    }
}
