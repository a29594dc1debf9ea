//! Salesforce Bulk API v2 Ingest Client.
//!
//! This module provides functionality to:
//! - Create bulk ingest jobs (insert, update, upsert, delete, hardDelete)
//! - Upload a [`Formatter`] body as the job's CSV data
//! - Close, abort and delete jobs
//! - Poll job status
//!
//! Every non-success response becomes an error through [`handle_response`],
//! so its message is `"<status line>: <body>"`.
//!
//! # Security
//!
//! - Raw CSV contents are never logged
//! - Auth headers and tokens are never logged
//! - Only HTTP method, path, and status codes are logged

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::bulk::Formatter;
use crate::error::AppError;
use crate::salesforce::api_error::handle_response;
use crate::salesforce::job::{BulkJobState, CreateIngestJobRequest, IngestJobInfo};
use crate::salesforce::API_VERSION;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// User agent string for all Salesforce API requests.
const CLIENT_USER_AGENT: &str = "StampedeBulk/0.1.0";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Internal Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Create request as sent: the public request plus the fixed content type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireCreateJobRequest<'a> {
    #[serde(flatten)]
    request: &'a CreateIngestJobRequest,
    content_type: &'static str,
}

/// Request body for changing job state (close or abort).
#[derive(Debug, Serialize)]
struct UpdateJobStateRequest {
    state: &'static str,
}

// ─────────────────────────────────────────────────────────────────────────────
// BulkIngestV2Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for Salesforce Bulk API v2 ingest operations.
#[derive(Clone)]
pub struct BulkIngestV2Client {
    /// Shared HTTP client.
    client: Arc<Client>,
    /// Base instance URL (e.g., "https://na1.salesforce.com").
    base_url: Url,
    /// Access token for authentication.
    access_token: SecretString,
}

impl std::fmt::Debug for BulkIngestV2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkIngestV2Client")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl BulkIngestV2Client {
    /// Creates a new Bulk API v2 ingest client.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `base_url` - Salesforce instance URL
    /// * `access_token` - OAuth access token
    pub fn new(client: Arc<Client>, base_url: Url, access_token: SecretString) -> Self {
        Self {
            client,
            base_url,
            access_token,
        }
    }

    /// Creates a client with its own HTTP client (default timeout and user agent).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client fails to initialize.
    pub fn connect(base_url: Url, access_token: SecretString) -> Result<Self, AppError> {
        let client = build_http_client()?;
        Ok(Self::new(Arc::new(client), base_url, access_token))
    }

    /// Creates a new bulk ingest job.
    ///
    /// # Returns
    ///
    /// The created job, whose dialect a [`Formatter`] should be built from.
    ///
    /// # Errors
    ///
    /// - `AppError::HttpStatus` / `AppError::ReadBody` - API error
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn create_ingest_job(
        &self,
        req: &CreateIngestJobRequest,
    ) -> Result<IngestJobInfo, AppError> {
        let url = self.build_jobs_url()?;

        let body = WireCreateJobRequest {
            request: req,
            content_type: "CSV",
        };

        info!(
            "[BULK-INGEST] POST /jobs/ingest (creating {} job for {})",
            format!("{:?}", req.operation).to_lowercase(),
            req.object
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Ingest job creation failed: {}", e)))?;

        let status = response.status();
        info!("[BULK-INGEST] POST /jobs/ingest -> {}", status.as_u16());

        if !status.is_success() {
            return Err(handle_response(response).await);
        }

        response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse job creation response: {}", e))
        })
    }

    /// Uploads the formatter's current body as the job's CSV data.
    ///
    /// # Errors
    ///
    /// - `AppError::HttpStatus` / `AppError::ReadBody` - API error
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn upload_job_data(&self, job_id: &str, formatter: &Formatter) -> Result<(), AppError> {
        let url = self.build_batches_url(job_id)?;
        let body = formatter.reader().into_inner();

        info!(
            "[BULK-INGEST] PUT /jobs/ingest/{}/batches ({} rows, {} bytes)",
            redact_id(job_id),
            formatter.row_count(),
            body.len()
        );

        let response = self
            .client
            .put(url)
            .bearer_auth(self.access_token.expose_secret())
            .header("Content-Type", "text/csv")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("CSV upload failed: {}", e)))?;

        let status = response.status();
        info!(
            "[BULK-INGEST] PUT /jobs/ingest/{}/batches -> {}",
            redact_id(job_id),
            status.as_u16()
        );

        if !status.is_success() {
            return Err(handle_response(response).await);
        }

        Ok(())
    }

    /// Marks the job upload complete so Salesforce starts processing.
    pub async fn close_job(&self, job_id: &str) -> Result<IngestJobInfo, AppError> {
        self.update_state(job_id, "UploadComplete", "closing").await
    }

    /// Aborts a bulk ingest job.
    ///
    /// # Note
    ///
    /// Abort is best-effort. The job may have already completed or failed.
    pub async fn abort_job(&self, job_id: &str) -> Result<IngestJobInfo, AppError> {
        self.update_state(job_id, "Aborted", "aborting").await
    }

    /// Gets the current status of a bulk ingest job.
    ///
    /// # Errors
    ///
    /// - `AppError::JobFailed` - Job is in failed state
    /// - `AppError::HttpStatus` / `AppError::ReadBody` - API error
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn get_job_status(&self, job_id: &str) -> Result<IngestJobInfo, AppError> {
        let url = self.build_job_url(job_id)?;

        info!(
            "[BULK-INGEST] GET /jobs/ingest/{} (status)",
            redact_id(job_id)
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Job status check failed: {}", e)))?;

        let status = response.status();
        info!(
            "[BULK-INGEST] GET /jobs/ingest/{} -> {}",
            redact_id(job_id),
            status.as_u16()
        );

        if !status.is_success() {
            return Err(handle_response(response).await);
        }

        let job_info: IngestJobInfo = response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse job status response: {}", e))
        })?;

        if job_info.state == BulkJobState::Failed {
            return Err(AppError::JobFailed {
                job_id: job_id.to_string(),
                message: job_info
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        Ok(job_info)
    }

    /// Deletes a job. Only closed, aborted or finished jobs can be deleted.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), AppError> {
        let url = self.build_job_url(job_id)?;

        info!(
            "[BULK-INGEST] DELETE /jobs/ingest/{}",
            redact_id(job_id)
        );

        let response = self
            .client
            .delete(url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Job delete failed: {}", e)))?;

        let status = response.status();
        info!(
            "[BULK-INGEST] DELETE /jobs/ingest/{} -> {}",
            redact_id(job_id),
            status.as_u16()
        );

        if !status.is_success() {
            return Err(handle_response(response).await);
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn update_state(
        &self,
        job_id: &str,
        state: &'static str,
        action: &str,
    ) -> Result<IngestJobInfo, AppError> {
        let url = self.build_job_url(job_id)?;

        info!(
            "[BULK-INGEST] PATCH /jobs/ingest/{} ({})",
            redact_id(job_id),
            action
        );

        let response = self
            .client
            .patch(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&UpdateJobStateRequest { state })
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Job {} failed: {}", action, e)))?;

        let status = response.status();
        info!(
            "[BULK-INGEST] PATCH /jobs/ingest/{} -> {}",
            redact_id(job_id),
            status.as_u16()
        );

        if !status.is_success() {
            return Err(handle_response(response).await);
        }

        response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse job state response: {}", e))
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // URL Builders
    // ─────────────────────────────────────────────────────────────────────────

    /// Builds the base jobs URL: /services/data/vXX.X/jobs/ingest
    fn build_jobs_url(&self) -> Result<Url, AppError> {
        let path = format!("/services/data/{}/jobs/ingest", API_VERSION);
        self.base_url.join(&path).map_err(|e| {
            AppError::Internal(format!("Failed to build jobs URL: {}", e))
        })
    }

    /// Builds a specific job URL: /services/data/vXX.X/jobs/ingest/{job_id}
    fn build_job_url(&self, job_id: &str) -> Result<Url, AppError> {
        let path = format!("/services/data/{}/jobs/ingest/{}", API_VERSION, job_id);
        self.base_url.join(&path).map_err(|e| {
            AppError::Internal(format!("Failed to build job URL: {}", e))
        })
    }

    /// Builds the batches URL: /services/data/vXX.X/jobs/ingest/{job_id}/batches
    fn build_batches_url(&self, job_id: &str) -> Result<Url, AppError> {
        let path = format!(
            "/services/data/{}/jobs/ingest/{}/batches",
            API_VERSION, job_id
        );
        self.base_url.join(&path).map_err(|e| {
            AppError::Internal(format!("Failed to build batches URL: {}", e))
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Builds an HTTP client with the crate's user agent and timeout.
fn build_http_client() -> Result<Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Redacts a job ID for logging (shows first 8 chars).
fn redact_id(id: &str) -> String {
    match id.char_indices().nth(8) {
        Some((idx, _)) => format!("{}...", &id[..idx]),
        None => id.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
