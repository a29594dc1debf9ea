//! Salesforce Bulk API 2.0 ingest plumbing.
//!
//! - **Job configuration** with the CSV dialect every upload must follow
//! - **Error decoding** for `statusCode` / `errorCode` payloads and flat
//!   `"<status>: <body>"` errors for failed responses
//! - **Ingest client** for the job lifecycle (create, upload, close, abort,
//!   delete, status)

pub mod api_error;
pub mod bulk_ingest_v2;
pub mod job;

pub use api_error::{handle_error, handle_response, SalesforceApiError};
pub use bulk_ingest_v2::BulkIngestV2Client;
pub use job::{
    BulkJobState, BulkOperation, ColumnDelimiter, CreateIngestJobRequest, IngestJobInfo,
    LineEnding,
};

/// Salesforce REST API version used for all requests.
pub const API_VERSION: &str = "v60.0";
