//! Cloud-drive uploader.
//!
//! Uses the drive REST API's multipart upload: one metadata part naming the
//! file (and target folder, when configured), one media part carrying the
//! bytes. The returned file id and web link feed the store stage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use super::error::UploadError;
use super::{UploadInfo, UploadService, UploadedArtifact, Uploader, file_name};
use crate::config::{Config, ConfigError};

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(rename = "webViewLink")]
    web_view_link: Option<String>,
}

/// Uploader for the cloud-drive destination.
pub struct DriveUploader {
    client: Client,
    access_token: String,
    folder_id: Option<String>,
    api_base: String,
}

impl DriveUploader {
    /// Builds the uploader from the `[drive]` config section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.require("drive", "access_token")?,
            config.get("drive", "folder_id").map(ToString::to_string),
        ))
    }

    /// Creates an uploader against the production API.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(access_token: impl Into<String>, folder_id: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            access_token: access_token.into(),
            folder_id,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL (tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn upload_one(&self, path: &Path) -> Result<UploadedArtifact, UploadError> {
        let name = file_name(path)?;
        let url = format!(
            "{}/files?uploadType=multipart&fields=id,webViewLink",
            self.api_base
        );

        let mut metadata = serde_json::json!({ "name": name });
        if let Some(folder_id) = &self.folder_id {
            metadata["parents"] = serde_json::json!([folder_id]);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::io(path.to_path_buf(), source))?;
        debug!(file = %path.display(), bytes = bytes.len(), "uploading to drive");

        let form = Form::new()
            .part(
                "metadata",
                Part::text(metadata.to_string()).mime_str("application/json")
                    .map_err(|source| UploadError::network(&url, source))?,
            )
            .part("media", Part::bytes(bytes).file_name(name.to_string()));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|source| UploadError::network(&url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::http_status(&url, status.as_u16()));
        }

        let file: DriveFile = response
            .json()
            .await
            .map_err(|source| UploadError::network(&url, source))?;

        Ok(UploadedArtifact {
            local: path.to_path_buf(),
            remote_id: file.id,
            link: file.web_view_link,
        })
    }
}

#[async_trait]
impl Uploader for DriveUploader {
    fn service(&self) -> UploadService {
        UploadService::Drive
    }

    async fn upload(&self, paths: &[PathBuf]) -> Result<UploadInfo, UploadError> {
        let mut artifacts = Vec::with_capacity(paths.len());
        for path in paths {
            artifacts.push(self.upload_one(path).await?);
        }
        info!(files = artifacts.len(), "uploaded to drive");
        Ok(UploadInfo {
            service: UploadService::Drive,
            artifacts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn temp_file(name: &str, contents: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        tokio::fs::write(&path, contents).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_drive_upload_returns_id_and_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .and(query_param("uploadType", "multipart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file-123",
                "webViewLink": "https://drive.example.com/file-123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, file) = temp_file("book.pdf", b"pdf bytes").await;
        let uploader = DriveUploader::new("token", None).with_api_base(server.uri());
        let info = uploader.upload(&[file.clone()]).await.unwrap();

        assert_eq!(info.service, UploadService::Drive);
        assert_eq!(info.artifacts.len(), 1);
        assert_eq!(info.artifacts[0].remote_id, "file-123");
        assert_eq!(
            info.artifacts[0].link.as_deref(),
            Some("https://drive.example.com/file-123")
        );
        assert_eq!(info.artifacts[0].local, file);
    }

    #[tokio::test]
    async fn test_drive_upload_maps_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let (_dir, file) = temp_file("book.pdf", b"pdf bytes").await;
        let uploader = DriveUploader::new("token", None).with_api_base(server.uri());
        let error = uploader.upload(&[file]).await.unwrap_err();
        assert!(matches!(error, UploadError::HttpStatus { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_drive_upload_missing_local_file_is_io_error() {
        let uploader = DriveUploader::new("token", None)
            .with_api_base("http://127.0.0.1:9".to_string());
        let error = uploader
            .upload(&[PathBuf::from("/nonexistent/book.pdf")])
            .await
            .unwrap_err();
        assert!(matches!(error, UploadError::Io { .. }));
    }
}
