//! Files API: resumable upload, readiness polling and cleanup.

use std::time::{Duration, Instant};

use serde::Deserialize;

use super::{response::api_error, GatewayError};
use crate::services::staging::StagedUpload;
use crate::utils::retry::{retry_async_when, RetryConfig};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    StateUnspecified,
    Processing,
    Active,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    pub state: Option<FileState>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

/// Connection details shared by the file operations.
#[derive(Debug, Clone)]
pub struct FilesApi<'a> {
    pub http: &'a reqwest::Client,
    pub base_url: &'a str,
    pub api_key: &'a str,
}

impl FilesApi<'_> {
    /// Two-step resumable upload: start, then upload and finalize in one request.
    pub async fn upload(&self, file: &StagedUpload) -> Result<RemoteFile, GatewayError> {
        let bytes = file
            .read()
            .await
            .map_err(|err| GatewayError::Staging(err.to_string()))?;

        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", file.mime_type())
            .json(&serde_json::json!({"file": {"display_name": file.filename()}}))
            .send()
            .await?;

        let status = start.status();
        if !status.is_success() {
            let body = start.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                GatewayError::InvalidResponse("upload session has no upload URL".to_string())
            })?;

        let finish = self
            .http
            .post(upload_url)
            .header("Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        let status = finish.status();
        let body = finish.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let uploaded: UploadResponse = serde_json::from_str(&body)
            .map_err(|err| GatewayError::InvalidResponse(format!("upload reply: {}", err)))?;
        tracing::info!(
            "Uploaded {} to Files API as {}",
            file.filename(),
            uploaded.file.name
        );
        Ok(uploaded.file)
    }

    pub async fn get(&self, name: &str) -> Result<RemoteFile, GatewayError> {
        let response = self
            .http
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        serde_json::from_str(&body)
            .map_err(|err| GatewayError::InvalidResponse(format!("file status reply: {}", err)))
    }

    /// Polls until the file is `ACTIVE`. `FAILED` and the deadline are errors.
    pub async fn wait_until_active(
        &self,
        mut file: RemoteFile,
        interval: Duration,
        timeout: Duration,
    ) -> Result<RemoteFile, GatewayError> {
        let deadline = Instant::now() + timeout;

        loop {
            match file.state {
                Some(FileState::Active) => return Ok(file),
                Some(FileState::Failed) => {
                    let detail = file
                        .error
                        .as_ref()
                        .map(|err| err.to_string())
                        .unwrap_or_else(|| "remote processing failed".to_string());
                    return Err(GatewayError::FileProcessing(format!("{}: {}", file.name, detail)));
                }
                _ => {}
            }

            if Instant::now() + interval > deadline {
                return Err(GatewayError::Timeout(format!(
                    "{} not ready after {}s",
                    file.name,
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(interval).await;

            let name = file.name.clone();
            let name = name.as_str();
            file = retry_async_when(RetryConfig::status_lookup(), is_retryable_lookup, move || {
                self.get(name)
            })
            .await?;
            tracing::debug!("File {} state {:?}", file.name, file.state);
        }
    }

    pub async fn delete(&self, name: &str) {
        let result = self
            .http
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", self.api_key)
            .send()
            .await;
        if let Err(err) = result {
            tracing::warn!("Failed to delete remote file {}: {}", name, err);
        }
    }
}

fn is_retryable_lookup(err: &GatewayError) -> bool {
    match err {
        GatewayError::Transport(_) | GatewayError::Timeout(_) => true,
        GatewayError::Api { http_status, .. } => *http_status == 429 || *http_status >= 500,
        _ => false,
    }
}
