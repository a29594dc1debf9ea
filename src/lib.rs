//! Bulk API 2.0 ingest bodies and error normalization.
//!
//! [`bulk::Formatter`] turns records into the CSV document an ingest job
//! uploads. [`salesforce`] holds the job configuration, the error decoder
//! and a thin ingest client.

pub mod bulk;
pub mod error;
pub mod salesforce;

pub use error::{AppError, ErrorPresentation};
