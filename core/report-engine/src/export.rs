//! FILENAME: core/report-engine/src/export.rs
//! CSV serialization with configurable delimiter, quote and escape
//! conventions.
//!
//! Quoting semantics follow the classic CSV module rules: `All` and
//! `NonNumeric` quote unconditionally (doubling embedded quote chars),
//! `Minimal` quotes only fields containing a special character, and
//! `None` never quotes - a special character then requires an escape
//! character or the export fails.

use crate::error::ReportError;
use crate::report::Cell;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Characters accepted as field delimiters by the export form.
pub const DELIMITERS: &str = ";,|:";
/// Characters accepted as quote characters by the export form.
pub const QUOTECHARS: &str = "\"'`";

/// When fields get wrapped in quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quoting {
    All,
    Minimal,
    NonNumeric,
    None,
}

impl Default for Quoting {
    fn default() -> Self {
        Quoting::NonNumeric
    }
}

/// Caller-configurable CSV export options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Write a first row of field labels.
    pub header: bool,
    /// Write a trailing totals row (reports with totals only).
    pub totals: bool,
    pub delimiter: char,
    pub quotechar: char,
    pub quoting: Quoting,
    pub escapechar: Option<char>,
    /// Literal preamble rows written before everything else.
    pub extra_rows: Option<Vec<Vec<String>>>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            header: true,
            totals: true,
            delimiter: ';',
            quotechar: '"',
            quoting: Quoting::NonNumeric,
            escapechar: None,
            extra_rows: None,
        }
    }
}

impl CsvOptions {
    /// The export-form whitelist: delimiter in `;,|:`, quote in
    /// ``"'` ``, escape absent or a single backslash. The presentation
    /// core applies whatever valid combination it receives; this check
    /// belongs to the surrounding form layer.
    pub fn validate(&self) -> Result<(), ReportError> {
        if !DELIMITERS.contains(self.delimiter) {
            return Err(ReportError::InvalidExportOption(format!(
                "delimiter {:?}",
                self.delimiter
            )));
        }
        if !QUOTECHARS.contains(self.quotechar) {
            return Err(ReportError::InvalidExportOption(format!(
                "quote character {:?}",
                self.quotechar
            )));
        }
        if let Some(esc) = self.escapechar {
            if esc != '\\' {
                return Err(ReportError::InvalidExportOption(format!(
                    "escape character {:?}",
                    esc
                )));
            }
        }
        Ok(())
    }
}

/// Streaming CSV writer over any `io::Write`.
pub struct CsvWriter<'a, W: Write> {
    out: &'a mut W,
    options: &'a CsvOptions,
}

impl<'a, W: Write> CsvWriter<'a, W> {
    pub fn new(out: &'a mut W, options: &'a CsvOptions) -> Self {
        CsvWriter { out, options }
    }

    fn is_special(&self, c: char) -> bool {
        c == self.options.delimiter || c == self.options.quotechar || c == '\n' || c == '\r'
    }

    /// Encodes one field according to the quoting policy.
    fn encode(&self, text: &str, numeric: bool) -> Result<String, ReportError> {
        let must_quote = match self.options.quoting {
            Quoting::All => true,
            Quoting::NonNumeric => !numeric,
            Quoting::Minimal => text.chars().any(|c| self.is_special(c)),
            Quoting::None => false,
        };
        if must_quote {
            let quote = self.options.quotechar;
            let mut encoded = String::with_capacity(text.len() + 2);
            encoded.push(quote);
            for c in text.chars() {
                if c == quote {
                    match self.options.escapechar {
                        Some(esc) => encoded.push(esc),
                        None => encoded.push(quote),
                    }
                }
                encoded.push(c);
            }
            encoded.push(quote);
            return Ok(encoded);
        }
        if !text.chars().any(|c| self.is_special(c)) {
            return Ok(text.to_string());
        }
        match self.options.escapechar {
            Some(esc) => {
                let mut encoded = String::with_capacity(text.len());
                for c in text.chars() {
                    if self.is_special(c) {
                        encoded.push(esc);
                    }
                    encoded.push(c);
                }
                Ok(encoded)
            }
            None => Err(ReportError::UnescapableDelimiter),
        }
    }

    fn write_line(&mut self, encoded: Vec<String>) -> Result<(), ReportError> {
        let delimiter = self.options.delimiter.to_string();
        let mut line = encoded.join(&delimiter);
        line.push_str("\r\n");
        self.out.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Writes one row of resolved cells. Numeric cells stay unquoted
    /// under non-numeric quoting.
    pub fn write_cells(&mut self, cells: &[Cell]) -> Result<(), ReportError> {
        let encoded = cells
            .iter()
            .map(|cell| self.encode(&cell.value.display(), cell.value.is_number()))
            .collect::<Result<Vec<_>, _>>()?;
        self.write_line(encoded)
    }

    /// Writes one row of literal strings (header labels, preamble rows).
    pub fn write_strings(&mut self, fields: &[String]) -> Result<(), ReportError> {
        let encoded = fields
            .iter()
            .map(|f| self.encode(f, false))
            .collect::<Result<Vec<_>, _>>()?;
        self.write_line(encoded)
    }
}
