//! CSV request body builder for Bulk API 2.0 ingest uploads.
//!
//! The body is buffered in memory: a header row followed by one row per
//! record, using the job's column delimiter and line ending.
//!
//! # Quoting
//!
//! A non-empty cell is quoted when it contains the delimiter, a quote, CR or
//! LF, when its first character is whitespace, or when it is exactly `\.`.
//! Embedded quotes are doubled. With a CRLF job, line breaks inside quoted
//! cells are written as CRLF and bare CRs are dropped.
//!
//! # Security
//!
//! - Cell values are never logged, only row and byte counts

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Cursor;

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use tracing::debug;

use crate::bulk::record::Record;
use crate::error::AppError;
use crate::salesforce::{IngestJobInfo, LineEnding};

/// Cell written for absent or null fields of records that insert nulls.
pub const NULL_MARKER: &str = "#N/A";

/// Accumulates records into a CSV upload body.
///
/// One formatter per upload batch. `add` needs `&mut self`, so concurrent
/// producers must share it behind a lock or own one each.
pub struct Formatter {
    fields: Vec<String>,
    writer: Writer<Vec<u8>>,
    delimiter: u8,
    line_ending: LineEnding,
    rows: u64,
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("fields", &self.fields)
            .field("rows", &self.rows)
            .field("bytes", &self.writer.get_ref().len())
            .finish()
    }
}

impl Formatter {
    /// Creates a formatter for `job` with the given column order and writes
    /// the header row.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidArgument` - `fields` is empty or has duplicates
    /// - `AppError::Io` - The header could not be written
    pub fn new<S: AsRef<str>>(job: &IngestJobInfo, fields: &[S]) -> Result<Self, AppError> {
        if fields.is_empty() {
            return Err(AppError::InvalidArgument(
                "bulk formatter: fields are required".to_string(),
            ));
        }

        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        let mut seen = HashSet::with_capacity(fields.len());
        if let Some(dup) = fields.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(AppError::InvalidArgument(format!(
                "bulk formatter: duplicate field '{}'",
                dup
            )));
        }

        let terminator = match job.line_ending {
            LineEnding::LF => Terminator::Any(b'\n'),
            LineEnding::CRLF => Terminator::CRLF,
        };

        // Cells arrive already escaped by `escape_cell`.
        let writer = WriterBuilder::new()
            .delimiter(job.delimiter())
            .terminator(terminator)
            .quote_style(QuoteStyle::Never)
            .has_headers(false)
            .from_writer(Vec::new());

        let mut formatter = Self {
            fields,
            writer,
            delimiter: job.delimiter(),
            line_ending: job.line_ending,
            rows: 0,
        };

        let header = formatter.fields.clone();
        formatter.write_row(header.iter().map(String::as_str))?;
        formatter.writer.flush()?;

        debug!(
            columns = formatter.fields.len(),
            bytes = formatter.writer.get_ref().len(),
            "Bulk body header written"
        );

        Ok(formatter)
    }

    fn write_row<'a, I>(&mut self, cells: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (delimiter, line_ending) = (self.delimiter, self.line_ending);
        self.writer.write_record(cells.into_iter().map(|cell| {
            match escape_cell(cell, delimiter, line_ending) {
                Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
                Cow::Owned(s) => Cow::Owned(s.into_bytes()),
            }
        }))?;
        Ok(())
    }

    /// Appends one row per record, in order, and flushes.
    ///
    /// Each row has exactly one cell per schema field. A field that is
    /// absent or null becomes `#N/A` when the record inserts nulls and an
    /// empty cell otherwise. Fields outside the schema are ignored.
    ///
    /// # Errors
    ///
    /// - `AppError::Io` - Writing a row or flushing failed
    pub fn add<R: Record>(&mut self, records: &[R]) -> Result<(), AppError> {
        for record in records {
            let values = record.fields();
            let default = if record.insert_null() { NULL_MARKER } else { "" };

            let row: Vec<String> = self
                .fields
                .iter()
                .map(|field| match values.get(field) {
                    Some(value) if !value.is_null() => value.to_string(),
                    _ => default.to_string(),
                })
                .collect();

            self.write_row(row.iter().map(String::as_str))?;
            self.rows += 1;
        }
        self.writer.flush()?;

        debug!(
            added = records.len(),
            rows = self.rows,
            bytes = self.writer.get_ref().len(),
            "Bulk body rows written"
        );

        Ok(())
    }

    /// Returns a cursor over the body written so far.
    ///
    /// Each call starts a fresh cursor at the beginning; the buffer keeps
    /// growing with later `add` calls.
    pub fn reader(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.writer.get_ref().clone())
    }

    /// The column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Rows written, excluding the header.
    pub fn row_count(&self) -> u64 {
        self.rows
    }

    /// Body size in bytes.
    pub fn len(&self) -> usize {
        self.writer.get_ref().len()
    }

    /// Always false: the header is written on construction.
    pub fn is_empty(&self) -> bool {
        self.writer.get_ref().is_empty()
    }
}

fn needs_quotes(cell: &str, delimiter: u8) -> bool {
    if cell.is_empty() {
        return false;
    }
    if cell == r"\." {
        return true;
    }
    if cell
        .bytes()
        .any(|b| b == delimiter || matches!(b, b'"' | b'\r' | b'\n'))
    {
        return true;
    }
    cell.chars().next().is_some_and(char::is_whitespace)
}

/// Quotes `cell` when needed, doubling embedded quotes. CRLF jobs get
/// `\n` → `\r\n` with bare `\r` dropped inside quoted cells.
fn escape_cell(cell: &str, delimiter: u8, line_ending: LineEnding) -> Cow<'_, str> {
    if !needs_quotes(cell, delimiter) {
        return Cow::Borrowed(cell);
    }

    let mut out = String::with_capacity(cell.len() + 2);
    out.push('"');
    for ch in cell.chars() {
        match (ch, line_ending) {
            ('"', _) => out.push_str("\"\""),
            ('\r', LineEnding::CRLF) => {}
            ('\n', LineEnding::CRLF) => out.push_str("\r\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
