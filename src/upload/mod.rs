//! Upload destinations for claimed artifacts.
//!
//! Destinations are a closed set of [`UploadService`] variants, each backed
//! by an [`Uploader`] implementation. Whether a destination's result can be
//! persisted by the store stage is a property of the variant
//! ([`UploadService::is_storable`]), not a string comparison.

mod drive;
mod dropbox;
mod error;
mod scp;

pub use drive::DriveUploader;
pub use dropbox::DropboxUploader;
pub use error::UploadError;
pub use scp::ScpUploader;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{Config, ConfigError};

/// Supported upload destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadService {
    /// Cloud drive; the one destination whose result the store stage persists.
    Drive,
    /// File-sync service.
    Dropbox,
    /// Remote copy over SSH.
    Scp,
}

impl UploadService {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Dropbox => "dropbox",
            Self::Scp => "scp",
        }
    }

    /// True for the single destination whose upload result is worth
    /// persisting via the recorder.
    #[must_use]
    pub fn is_storable(self) -> bool {
        matches!(self, Self::Drive)
    }
}

impl std::fmt::Display for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded file and where it ended up.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedArtifact {
    /// The local file that was uploaded.
    pub local: PathBuf,
    /// Destination-specific identifier (file id, remote path, ...).
    pub remote_id: String,
    /// Shareable link, when the destination provides one.
    pub link: Option<String>,
}

/// Result object describing a completed upload.
///
/// Only produced when an upload actually occurred; absence of an
/// `UploadInfo` means the upload stage was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct UploadInfo {
    /// The destination that received the files.
    pub service: UploadService,
    /// Per-file upload results, in upload order.
    pub artifacts: Vec<UploadedArtifact>,
}

impl UploadInfo {
    /// Shareable links of all artifacts that have one.
    #[must_use]
    pub fn links(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter_map(|artifact| artifact.link.as_deref())
            .collect()
    }
}

/// Trait implemented per upload destination.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// The destination this uploader targets.
    fn service(&self) -> UploadService;

    /// Transfers the given local files, returning the remote result.
    async fn upload(&self, paths: &[PathBuf]) -> Result<UploadInfo, UploadError>;
}

/// Builds the uploader for the selected destination from configuration.
///
/// Fails fast on missing credentials so configuration problems surface
/// before the claim stage runs.
pub fn build_uploader(
    service: UploadService,
    config: &Config,
) -> Result<Box<dyn Uploader>, ConfigError> {
    Ok(match service {
        UploadService::Drive => Box::new(DriveUploader::from_config(config)?),
        UploadService::Dropbox => Box::new(DropboxUploader::from_config(config)?),
        UploadService::Scp => Box::new(ScpUploader::from_config(config)?),
    })
}

/// Final path segment as UTF-8, required by every destination.
pub(crate) fn file_name(path: &Path) -> Result<&str, UploadError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| UploadError::InvalidPath {
            path: path.to_path_buf(),
        })
}
