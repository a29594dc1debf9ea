//! Bulk API 2.0 ingest job configuration and wire types.
//!
//! The job carries the CSV dialect (column delimiter and line ending) that
//! every uploaded body must follow. The [`Formatter`](crate::bulk::Formatter)
//! reads both settings once, at construction.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// CSV Dialect
// ─────────────────────────────────────────────────────────────────────────────

/// Column delimiter accepted by the Bulk API.
///
/// Serialized with the Salesforce names ("COMMA", "PIPE", ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnDelimiter {
    /// Backquote (`` ` ``).
    Backquote,
    /// Caret (`^`).
    Caret,
    /// Comma (`,`).
    #[default]
    Comma,
    /// Pipe (`|`).
    Pipe,
    /// Semicolon (`;`).
    Semicolon,
    /// Tab (`\t`).
    Tab,
}

impl ColumnDelimiter {
    /// The delimiter byte written between cells.
    pub fn as_byte(self) -> u8 {
        match self {
            ColumnDelimiter::Backquote => b'`',
            ColumnDelimiter::Caret => b'^',
            ColumnDelimiter::Comma => b',',
            ColumnDelimiter::Pipe => b'|',
            ColumnDelimiter::Semicolon => b';',
            ColumnDelimiter::Tab => b'\t',
        }
    }
}

/// Line ending format for CSV files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    /// Unix-style line ending (\\n).
    #[default]
    LF,
    /// Windows-style line ending (\\r\\n).
    CRLF,
}

// ─────────────────────────────────────────────────────────────────────────────
// Job Types
// ─────────────────────────────────────────────────────────────────────────────

/// Bulk ingest operation type.
///
/// IMPORTANT: Uses `#[serde(rename_all = "lowercase")]` to match Salesforce API
/// which expects lowercase values ("insert", "update", "upsert", "delete").
/// `hardDelete` is the one camelCase exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperation {
    /// Insert new records.
    Insert,
    /// Update existing records by ID.
    Update,
    /// Insert or update records based on external ID field.
    Upsert,
    /// Delete records by ID.
    Delete,
    /// Delete records by ID, bypassing the recycle bin.
    #[serde(rename = "hardDelete")]
    HardDelete,
}

/// Lifecycle state of a bulk job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkJobState {
    /// Accepting data uploads.
    Open,
    /// Upload closed; queued for processing.
    UploadComplete,
    /// Salesforce is processing the data.
    InProgress,
    /// Processing finished.
    JobComplete,
    /// Processing failed; see `error_message`.
    Failed,
    /// Aborted by the client.
    Aborted,
}

/// Request body for creating an ingest job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJobRequest {
    /// The Salesforce object name (e.g., "Account", "Contact").
    pub object: String,
    /// The operation to perform.
    pub operation: BulkOperation,
    /// External ID field name (required for upsert operations).
    /// IMPORTANT: Skips serialization when None because Salesforce rejects
    /// null values for this field on insert operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    /// Column delimiter for the CSV data.
    pub column_delimiter: ColumnDelimiter,
    /// Line ending format for the CSV data.
    pub line_ending: LineEnding,
}

impl CreateIngestJobRequest {
    /// Creates a request with the default dialect (comma, LF).
    pub fn new(object: impl Into<String>, operation: BulkOperation) -> Self {
        Self {
            object: object.into(),
            operation,
            external_id_field_name: None,
            column_delimiter: ColumnDelimiter::default(),
            line_ending: LineEnding::default(),
        }
    }

    /// Sets the column delimiter.
    pub fn with_column_delimiter(mut self, delimiter: ColumnDelimiter) -> Self {
        self.column_delimiter = delimiter;
        self
    }

    /// Sets the line ending.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets the external ID field used by upserts.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }
}

/// Information about a Bulk API v2 ingest job.
///
/// This is the job configuration a [`Formatter`](crate::bulk::Formatter) is
/// built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestJobInfo {
    /// Unique identifier for the job.
    pub id: String,
    /// Current state of the job.
    pub state: BulkJobState,
    /// The Salesforce object being processed.
    pub object: String,
    /// The operation being performed.
    pub operation: BulkOperation,
    /// Column delimiter the uploaded CSV must use.
    #[serde(default)]
    pub column_delimiter: ColumnDelimiter,
    /// Line ending the uploaded CSV must use.
    #[serde(default)]
    pub line_ending: LineEnding,
    /// Number of records processed so far.
    #[serde(default, rename = "numberRecordsProcessed")]
    pub processed_records: Option<u64>,
    /// Number of records that failed processing.
    #[serde(default, rename = "numberRecordsFailed")]
    pub failed_records: Option<u64>,
    /// Error message if job failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl IngestJobInfo {
    /// The delimiter byte for this job's CSV bodies.
    pub fn delimiter(&self) -> u8 {
        self.column_delimiter.as_byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_delimiter_bytes() {
        assert_eq!(ColumnDelimiter::Backquote.as_byte(), b'`');
        assert_eq!(ColumnDelimiter::Caret.as_byte(), b'^');
        assert_eq!(ColumnDelimiter::Comma.as_byte(), b',');
        assert_eq!(ColumnDelimiter::Pipe.as_byte(), b'|');
        assert_eq!(ColumnDelimiter::Semicolon.as_byte(), b';');
        assert_eq!(ColumnDelimiter::Tab.as_byte(), b'\t');
    }

    #[test]
    fn test_dialect_wire_names() {
        assert_eq!(serde_json::to_string(&ColumnDelimiter::Semicolon).unwrap(), r#""SEMICOLON""#);
        assert_eq!(serde_json::to_string(&LineEnding::CRLF).unwrap(), r#""CRLF""#);
        assert_eq!(
            serde_json::from_str::<ColumnDelimiter>(r#""BACKQUOTE""#).unwrap(),
            ColumnDelimiter::Backquote
        );
    }

    #[test]
    fn test_bulk_operation_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BulkOperation::Insert).unwrap(), r#""insert""#);
        assert_eq!(serde_json::to_string(&BulkOperation::Upsert).unwrap(), r#""upsert""#);
        assert_eq!(serde_json::to_string(&BulkOperation::HardDelete).unwrap(), r#""hardDelete""#);
    }

    #[test]
    fn test_create_request_skips_null_external_id() {
        let req = CreateIngestJobRequest::new("Contact", BulkOperation::Insert);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "object": "Contact",
                "operation": "insert",
                "columnDelimiter": "COMMA",
                "lineEnding": "LF"
            })
        );
    }

    #[test]
    fn test_create_request_builders() {
        let req = CreateIngestJobRequest::new("Account", BulkOperation::Upsert)
            .with_external_id_field("External_Id__c")
            .with_column_delimiter(ColumnDelimiter::Pipe)
            .with_line_ending(LineEnding::CRLF);

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["externalIdFieldName"], "External_Id__c");
        assert_eq!(value["columnDelimiter"], "PIPE");
        assert_eq!(value["lineEnding"], "CRLF");
    }

    #[test]
    fn test_job_info_deserialization() {
        let json = r#"{
            "id": "750xx000000001ABC",
            "state": "Open",
            "object": "Account",
            "operation": "insert",
            "columnDelimiter": "TAB",
            "lineEnding": "CRLF",
            "numberRecordsProcessed": 1000,
            "numberRecordsFailed": 5,
            "errorMessage": null
        }"#;

        let info: IngestJobInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.id, "750xx000000001ABC");
        assert_eq!(info.state, BulkJobState::Open);
        assert_eq!(info.delimiter(), b'\t');
        assert_eq!(info.line_ending, LineEnding::CRLF);
        assert_eq!(info.processed_records, Some(1000));
        assert_eq!(info.failed_records, Some(5));
        assert!(info.error_message.is_none());
    }

    #[test]
    fn test_job_info_dialect_defaults() {
        let json = r#"{
            "id": "750xx000000001ABC",
            "state": "Open",
            "object": "Account",
            "operation": "insert"
        }"#;

        let info: IngestJobInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.delimiter(), b',');
        assert_eq!(info.line_ending, LineEnding::LF);
    }
}
