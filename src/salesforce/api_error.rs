//! Salesforce error payloads and failed-response normalization.
//!
//! Salesforce reports the error code under `statusCode` for some operations
//! and `errorCode` for others; both decode into [`SalesforceApiError::code`].
//!
//! Failed responses always become `"<status line>: <body>"`, even when the
//! body is a structured error. Callers that want the structured form use
//! [`AppError::api_errors`] or decode the body themselves.

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Internal Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Mirrors the Salesforce error JSON with both code spellings optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireApiError {
    message: String,
    #[serde(default)]
    fields: Option<Vec<String>>,
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Error bodies come as an array, but some endpoints return a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireApiErrors {
    Many(Vec<WireApiError>),
    One(WireApiError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// A decoded Salesforce API error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireApiError")]
pub struct SalesforceApiError {
    /// `statusCode` or `errorCode`; empty when the payload had neither.
    pub code: String,
    pub message: String,
    /// Fields the error refers to, in payload order.
    pub fields: Vec<String>,
}

impl From<WireApiError> for SalesforceApiError {
    fn from(wire: WireApiError) -> Self {
        Self {
            code: wire.status_code.or(wire.error_code).unwrap_or_default(),
            message: wire.message,
            fields: wire.fields.unwrap_or_default(),
        }
    }
}

impl fmt::Display for SalesforceApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl SalesforceApiError {
    /// Decodes a single error object.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Decode` if `data` is not JSON or has no string
    /// `message`.
    pub fn decode(data: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice::<WireApiError>(data)
            .map(Self::from)
            .map_err(|e| AppError::Decode(e.to_string()))
    }

    /// Decodes an error array, or a single object as a one-element list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Decode` if neither shape matches.
    pub fn decode_all(data: &[u8]) -> Result<Vec<Self>, AppError> {
        let wire: WireApiErrors =
            serde_json::from_slice(data).map_err(|e| AppError::Decode(e.to_string()))?;

        Ok(match wire {
            WireApiErrors::Many(errors) => errors.into_iter().map(Self::from).collect(),
            WireApiErrors::One(error) => vec![Self::from(error)],
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Failed Response Handling
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the error for a failed response from its status line and body.
///
/// Reads the whole body once. The result displays as `"<status>: <body>"`,
/// or `"<status>: could not read the body with error: <error>"` when the
/// read fails.
pub fn handle_error<R: Read>(status: &str, mut body: R) -> AppError {
    let mut buf = Vec::new();
    match body.read_to_end(&mut buf) {
        Ok(_) => AppError::HttpStatus {
            status: status.to_string(),
            body: String::from_utf8_lossy(&buf).into_owned(),
        },
        Err(e) => AppError::ReadBody {
            status: status.to_string(),
            message: e.to_string(),
        },
    }
}

/// Async counterpart of [`handle_error`] for `reqwest` responses.
///
/// The status line is `"<code> <reason>"`, e.g. `"400 Bad Request"`.
pub async fn handle_response(response: reqwest::Response) -> AppError {
    let status = status_line(response.status());
    match response.bytes().await {
        Ok(bytes) => AppError::HttpStatus {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        },
        Err(e) => AppError::ReadBody {
            status,
            message: e.to_string(),
        },
    }
}

fn status_line(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
