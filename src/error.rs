use serde::Serialize;
use thiserror::Error;

use crate::salesforce::SalesforceApiError;

/// Patterns (lowercase) that indicate sensitive data not safe for UI display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "bearer ",
    "refresh_token",
    "access_token",
    "client_secret",
    "authorization:",
];

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for UI display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// User-friendly error presentation for display layers.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Caller input ──────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ── Body formatting ───────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── Remote errors ─────────────────────────────────────────────────────────
    #[error("Failed to decode error body: {0}")]
    Decode(String),

    /// A failed response whose body was read. The message is exactly
    /// `"<status>: <body>"`.
    #[error("{status}: {body}")]
    HttpStatus { status: String, body: String },

    /// A failed response whose body could not be read.
    #[error("{status}: could not read the body with error: {message}")]
    ReadBody { status: String, message: String },

    // ── Bulk jobs ─────────────────────────────────────────────────────────────
    #[error("Bulk job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Io(std::io::Error::from(err))
    }
}

impl AppError {
    /// Structured Salesforce errors carried by an `HttpStatus` body, if the
    /// body decodes. The display message is unaffected.
    pub fn api_errors(&self) -> Option<Vec<SalesforceApiError>> {
        match self {
            AppError::HttpStatus { body, .. } => {
                SalesforceApiError::decode_all(body.as_bytes()).ok()
            }
            _ => None,
        }
    }

    /// Converts the error into a user-friendly presentation suitable for UI display.
    /// Never leaks secrets, tokens, or sensitive URL parameters.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            AppError::InvalidArgument(msg) => ErrorPresentation {
                title: "Invalid Request".into(),
                message: sanitize_message(msg, "The request was not valid."),
                action: Some("Fix the input and try again".into()),
            },

            AppError::Io(_) => ErrorPresentation {
                title: "Write Failed".into(),
                message: "Could not write the upload data.".into(),
                action: Some("Try again".into()),
            },

            AppError::Decode(_) => ErrorPresentation {
                title: "Unreadable Error".into(),
                message: "Salesforce returned an error that could not be understood.".into(),
                action: None,
            },

            AppError::HttpStatus { status, .. } => ErrorPresentation {
                title: "Salesforce Error".into(),
                message: match self.api_errors().and_then(|errs| errs.into_iter().next()) {
                    Some(api) => sanitize_message(&api.to_string(), "A Salesforce error occurred."),
                    None => sanitize_message(
                        &format!("Salesforce responded with {}.", status),
                        "A Salesforce error occurred.",
                    ),
                },
                action: Some("Review the error and try again".into()),
            },

            AppError::ReadBody { status, .. } => ErrorPresentation {
                title: "Salesforce Error".into(),
                message: sanitize_message(
                    &format!("Salesforce responded with {} and the details could not be read.", status),
                    "A Salesforce error occurred.",
                ),
                action: Some("Check network and retry".into()),
            },

            AppError::JobFailed { job_id: _, message } => ErrorPresentation {
                title: "Bulk Job Failed".into(),
                message: sanitize_message(message, "The bulk operation failed."),
                action: Some("Review the error and try again".into()),
            },

            AppError::ConnectionFailed(_) => ErrorPresentation {
                title: "Connection Failed".into(),
                message: "Could not connect to Salesforce. Please check your internet connection.".into(),
                action: Some("Check network and retry".into()),
            },

            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_presentation().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Returns all AppError variants for exhaustive testing.
    fn all_variants() -> Vec<AppError> {
        vec![
            AppError::InvalidArgument("fields are required".into()),
            AppError::Io(io::Error::new(io::ErrorKind::Other, "disk full")),
            AppError::Decode("missing field `message`".into()),
            AppError::HttpStatus {
                status: "400 Bad Request".into(),
                body: r#"{"message":"invalid"}"#.into(),
            },
            AppError::ReadBody {
                status: "500 Internal Server Error".into(),
                message: "unexpected EOF".into(),
            },
            AppError::JobFailed { job_id: "750xx000000001".into(), message: "test failure".into() },
            AppError::ConnectionFailed("timeout".into()),
            AppError::Internal("something broke".into()),
        ]
    }

    #[test]
    fn all_variants_have_nonempty_title_and_message() {
        for variant in all_variants() {
            let presentation = variant.to_presentation();
            assert!(
                !presentation.title.trim().is_empty(),
                "Empty title for {:?}",
                variant
            );
            assert!(
                !presentation.message.trim().is_empty(),
                "Empty message for {:?}",
                variant
            );
        }
    }

    #[test]
    fn http_status_message_is_status_and_body() {
        let err = AppError::HttpStatus {
            status: "400 Bad Request".into(),
            body: r#"{"message":"invalid"}"#.into(),
        };
        assert_eq!(err.to_string(), r#"400 Bad Request: {"message":"invalid"}"#);
    }

    #[test]
    fn read_body_message_names_the_read_error() {
        let err = AppError::ReadBody {
            status: "500 Internal Server Error".into(),
            message: "unexpected EOF".into(),
        };
        assert_eq!(
            err.to_string(),
            "500 Internal Server Error: could not read the body with error: unexpected EOF"
        );
    }

    #[test]
    fn io_error_is_transparent() {
        let err = AppError::from(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn api_errors_decodes_array_body() {
        let err = AppError::HttpStatus {
            status: "400 Bad Request".into(),
            body: r#"[{"errorCode":"INVALID_FIELD","message":"No such column","fields":["Foo__c"]}]"#
                .into(),
        };

        let errors = err.api_errors().expect("body should decode");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "INVALID_FIELD");
        assert_eq!(errors[0].fields, vec!["Foo__c".to_string()]);

        let presentation = err.to_presentation();
        assert!(presentation.message.contains("No such column"));
    }

    #[test]
    fn api_errors_is_none_for_plain_body() {
        let err = AppError::HttpStatus {
            status: "502 Bad Gateway".into(),
            body: "<html>gateway</html>".into(),
        };
        assert!(err.api_errors().is_none());
        assert!(AppError::Internal("x".into()).api_errors().is_none());
    }

    #[test]
    fn serialization_produces_valid_json_with_required_fields() {
        for variant in all_variants() {
            let json = serde_json::to_string(&variant)
                .expect(&format!("Failed to serialize {:?}", variant));

            let parsed: serde_json::Value = serde_json::from_str(&json)
                .expect(&format!("Failed to parse JSON for {:?}", variant));

            assert!(parsed.get("title").is_some(), "Serialized {:?} missing 'title'", variant);
            assert!(parsed.get("message").is_some(), "Serialized {:?} missing 'message'", variant);
            // action can be null, but field should exist
            assert!(parsed.get("action").is_some(), "Serialized {:?} missing 'action'", variant);
        }
    }

    #[test]
    fn no_secret_leakage_in_presentation() {
        let test_cases: Vec<(&str, AppError)> = vec![
            ("InvalidArgument", AppError::InvalidArgument("Bearer abc123".into())),
            ("HttpStatus", AppError::HttpStatus {
                status: "401 Unauthorized".into(),
                body: r#"[{"errorCode":"INVALID_SESSION_ID","message":"access_token=xyz expired"}]"#.into(),
            }),
            ("ConnectionFailed", AppError::ConnectionFailed("access_token=xyz client_secret=abc".into())),
            ("Internal", AppError::Internal("refresh_token leaked".into())),
            ("JobFailed", AppError::JobFailed {
                job_id: "750xx".into(),
                message: "Bearer token invalid".into(),
            }),
        ];

        for (label, variant) in test_cases {
            let presentation = variant.to_presentation();
            let output_lower = format!(
                "{} {} {}",
                presentation.title,
                presentation.message,
                presentation.action.as_deref().unwrap_or("")
            )
            .to_ascii_lowercase();

            for pattern in SENSITIVE_PATTERNS {
                assert!(
                    !output_lower.contains(pattern),
                    "{} presentation contains sensitive pattern",
                    label
                );
            }
        }
    }
}
