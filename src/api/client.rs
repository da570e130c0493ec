//! TestLab Web API client
//!
//! Thin client over the TestLab REST API. Every endpoint lives under
//! `{url_base}/api/v1.0/{organization}/{project}/` and authenticates with a
//! token header. Non-success responses surface the status line and the
//! verbatim response body; there are no retries at this layer.

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, StatusCode};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;
use crate::models::{BatchRun, BatchRunList, UploadedFile};

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success HTTP response, carrying the status line and raw body
    #[error("{status}: {body}")]
    Status { status: String, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("no batch run exists in this project")]
    NoBatchRuns,
}

/// Transport seam consumed by the batch run executor
///
/// `ApiClient` is the production implementation; tests script their own.
#[async_trait]
pub trait RunTransport {
    /// Start a batch run (or a cross batch run when `is_group`) and return
    /// the launched runs in launch order.
    async fn start_batch_run(
        &self,
        payload: &str,
        is_group: bool,
    ) -> Result<Vec<BatchRun>, ApiError>;

    /// Re-fetch the current status and counters of one batch run.
    async fn get_batch_run(&self, batch_run_number: u64) -> Result<BatchRun, ApiError>;
}

/// Screenshot download options forwarded to the server
#[derive(Clone, Debug, Default)]
pub struct ScreenshotOptions {
    pub file_index_type: String,
    pub file_name_body_type: String,
    pub download_type: String,
    pub mask_dynamically_changed_area: bool,
}

/// HTTP client for the TestLab Web API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    /// Build the full URL of a project-scoped endpoint
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/v1.0/{}/{}/{}",
            self.config.url_base.trim_end_matches('/'),
            self.config.organization,
            self.config.project,
            path
        )
    }

    /// Attach authorization and configured extra headers
    fn apply_headers(&self, mut builder: RequestBuilder) -> RequestBuilder {
        builder = builder
            .header("Authorization", format!("Token {}", self.config.token))
            .header("accept", "application/json");
        for (key, value) in &self.config.http_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    /// Send a request and return the response body on success.
    async fn send(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = self.apply_headers(builder).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("response: {} ({} bytes)", status, body.len());
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status_line(status),
                body,
            });
        }
        Ok(body)
    }

    /// Number of the most recent batch run in the project
    pub async fn latest_batch_run_number(&self) -> Result<u64, ApiError> {
        let url = self.endpoint("batch-runs/");
        debug!("GET {url}");
        let body = self.send(self.client.get(&url).query(&[("count", "1")])).await?;
        let list: BatchRunList = serde_json::from_str(&body)?;
        list.batch_runs
            .first()
            .map(|run| run.batch_run_number)
            .ok_or(ApiError::NoBatchRuns)
    }

    /// Upload an app/ipa/apk file to the server and return its file number
    pub async fn upload_app(&self, path: &Path) -> Result<u64, ApiError> {
        let url = self.endpoint("upload-file/");
        debug!("POST {url} ({})", path.display());
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app")
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));
        let body = self.send(self.client.post(&url).multipart(form)).await?;
        let uploaded: UploadedFile = serde_json::from_str(&body)?;
        Ok(uploaded.file_no)
    }

    /// Delete an uploaded app file on the server
    pub async fn delete_app(&self, app_file_number: u64) -> Result<(), ApiError> {
        let url = self.endpoint("delete-file/");
        debug!("DELETE {url} (file {app_file_number})");
        self.send(
            self.client
                .delete(&url)
                .header("Content-Type", "application/json")
                .body(format!("{{\"app_file_number\":{app_file_number}}}")),
        )
        .await?;
        Ok(())
    }

    /// Download the screenshot archive of a batch run to a local file
    pub async fn download_screenshots(
        &self,
        batch_run_number: u64,
        download_path: &Path,
        options: &ScreenshotOptions,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("batch-runs/{batch_run_number}/screenshots/"));
        debug!("GET {url}");
        let mask = if options.mask_dynamically_changed_area {
            "true"
        } else {
            "false"
        };
        let response = self
            .apply_headers(self.client.get(&url).query(&[
                ("file_index_type", options.file_index_type.as_str()),
                ("file_name_body_type", options.file_name_body_type.as_str()),
                ("download_type", options.download_type.as_str()),
                ("mask_dynamically_changed_area", mask),
            ]))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            // The body holds error information, not archive contents.
            let body = response.text().await?;
            return Err(ApiError::Status {
                status: status_line(status),
                body,
            });
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(download_path, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl RunTransport for ApiClient {
    async fn start_batch_run(
        &self,
        payload: &str,
        is_group: bool,
    ) -> Result<Vec<BatchRun>, ApiError> {
        let path = if is_group {
            "cross-batch-run/"
        } else {
            "batch-run/"
        };
        let url = self.endpoint(path);
        debug!("POST {url}");
        let body = self
            .send(
                self.client
                    .post(&url)
                    .header("Content-Type", "application/json")
                    .body(payload.to_string()),
            )
            .await?;
        if is_group {
            decode_group(&body)
        } else {
            Ok(vec![serde_json::from_str(&body)?])
        }
    }

    async fn get_batch_run(&self, batch_run_number: u64) -> Result<BatchRun, ApiError> {
        let url = self.endpoint(&format!("batch-run/{batch_run_number}/"));
        debug!("GET {url}");
        let body = self.send(self.client.get(&url)).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Format a status line the way the server reports it, e.g. `404 Not Found`
fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Decode a cross batch run response.
///
/// Servers earlier than 0.65 returned a bare batch run object instead of a
/// wrapped list, so the decode falls back in that order: wrapped list, bare
/// run, legally-empty group.
fn decode_group(body: &str) -> Result<Vec<BatchRun>, ApiError> {
    match serde_json::from_str::<BatchRunList>(body) {
        Ok(list) if !list.batch_runs.is_empty() => Ok(list.batch_runs),
        wrapped => match serde_json::from_str::<BatchRun>(body) {
            Ok(run) => Ok(vec![run]),
            Err(_) if wrapped.is_ok() => Ok(Vec::new()),
            Err(err) => Err(ApiError::Decode(err)),
        },
    }
}
