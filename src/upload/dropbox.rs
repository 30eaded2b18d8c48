//! File-sync uploader.
//!
//! Talks to the content-upload endpoint: request parameters travel in the
//! `Dropbox-API-Arg` header, the body is the raw file bytes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::error::UploadError;
use super::{UploadInfo, UploadService, UploadedArtifact, Uploader, file_name};
use crate::config::{Config, ConfigError};

const DEFAULT_API_BASE: &str = "https://content.dropboxapi.com/2";

#[derive(Debug, Deserialize)]
struct DropboxEntry {
    id: String,
    path_display: Option<String>,
}

/// Uploader for the file-sync destination.
pub struct DropboxUploader {
    client: Client,
    access_token: String,
    remote_dir: String,
    api_base: String,
}

impl DropboxUploader {
    /// Builds the uploader from the `[dropbox]` config section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.require("dropbox", "access_token")?,
            config.get("dropbox", "remote_dir").unwrap_or("/"),
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
    pub fn new(access_token: impl Into<String>, remote_dir: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            access_token: access_token.into(),
            remote_dir: remote_dir.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL (tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn remote_path(&self, name: &str) -> String {
        format!("{}/{name}", self.remote_dir.trim_end_matches('/'))
    }

    async fn upload_one(&self, path: &Path) -> Result<UploadedArtifact, UploadError> {
        let name = file_name(path)?;
        let url = format!("{}/files/upload", self.api_base);
        let arg = serde_json::json!({
            "path": self.remote_path(name),
            "mode": "add",
            "autorename": true,
        });

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::io(path.to_path_buf(), source))?;
        debug!(file = %path.display(), bytes = bytes.len(), "uploading to dropbox");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", arg.to_string())
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|source| UploadError::network(&url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::http_status(&url, status.as_u16()));
        }

        let entry: DropboxEntry = response
            .json()
            .await
            .map_err(|source| UploadError::network(&url, source))?;

        Ok(UploadedArtifact {
            local: path.to_path_buf(),
            remote_id: entry.id,
            link: entry.path_display,
        })
    }
}

#[async_trait]
impl Uploader for DropboxUploader {
    fn service(&self) -> UploadService {
        UploadService::Dropbox
    }

    async fn upload(&self, paths: &[PathBuf]) -> Result<UploadInfo, UploadError> {
        let mut artifacts = Vec::with_capacity(paths.len());
        for path in paths {
            artifacts.push(self.upload_one(path).await?);
        }
        info!(files = artifacts.len(), "uploaded to dropbox");
        Ok(UploadInfo {
            service: UploadService::Dropbox,
            artifacts,
        })
    }
}
