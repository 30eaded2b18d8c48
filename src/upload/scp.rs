//! Remote-copy uploader.
//!
//! Shells out to the system `scp` binary rather than speaking SSH
//! directly; the binary is located on PATH at upload time.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::UploadError;
use super::{UploadInfo, UploadService, UploadedArtifact, Uploader, file_name};
use crate::config::{Config, ConfigError};

/// Uploader that copies files to a remote host with `scp`.
pub struct ScpUploader {
    host: String,
    port: u16,
    user: String,
    remote_dir: String,
}

impl ScpUploader {
    /// Builds the uploader from the `[scp]` config section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let port = match config.get("scp", "port") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                section: "scp",
                key: "port",
                message: format!("expected a port number, got '{raw}'"),
            })?,
            None => 22,
        };
        Ok(Self {
            host: config.require("scp", "host")?.to_string(),
            port,
            user: config.require("scp", "user")?.to_string(),
            remote_dir: config.require("scp", "remote_dir")?.to_string(),
        })
    }

    fn destination(&self, name: &str) -> String {
        format!(
            "{}@{}:{}/{name}",
            self.user,
            self.host,
            self.remote_dir.trim_end_matches('/')
        )
    }

    async fn copy_one(&self, scp: &Path, path: &Path) -> Result<UploadedArtifact, UploadError> {
        let name = file_name(path)?;
        let destination = self.destination(name);
        debug!(file = %path.display(), destination = %destination, "copying over scp");

        let output = Command::new(scp)
            .arg("-P")
            .arg(self.port.to_string())
            .arg("-B")
            .arg(path)
            .arg(&destination)
            .output()
            .await
            .map_err(|source| UploadError::io(path.to_path_buf(), source))?;

        if !output.status.success() {
            return Err(UploadError::ToolFailed {
                program: "scp",
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(UploadedArtifact {
            local: path.to_path_buf(),
            remote_id: destination,
            link: None,
        })
    }
}

#[async_trait]
impl Uploader for ScpUploader {
    fn service(&self) -> UploadService {
        UploadService::Scp
    }

    async fn upload(&self, paths: &[PathBuf]) -> Result<UploadInfo, UploadError> {
        let scp = which::which("scp").map_err(|_| UploadError::ToolMissing { program: "scp" })?;

        let mut artifacts = Vec::with_capacity(paths.len());
        for path in paths {
            artifacts.push(self.copy_one(&scp, path).await?);
        }
        info!(files = artifacts.len(), host = %self.host, "copied over scp");
        Ok(UploadInfo {
            service: UploadService::Scp,
            artifacts,
        })
    }
}
