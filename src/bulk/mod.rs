//! Bulk ingest request bodies.
//!
//! Converts heterogeneous records into the CSV document a Bulk API 2.0
//! ingest job expects, honoring the job's column delimiter, line ending and
//! each record's null insertion policy.

mod formatter;
mod record;

pub use formatter::{Formatter, NULL_MARKER};
pub use record::{BulkRecord, FieldValue, Record};
