//! Persistence of claim/upload records.
//!
//! The store stage is fire-and-forget from the pipeline's perspective: the
//! recorder either persists the record or fails the run, nothing downstream
//! inspects its output.

mod error;
mod firebase;

pub use error::StoreError;
pub use firebase::FirebaseRecorder;

use async_trait::async_trait;

use crate::claim::ClaimInfo;
use crate::config::{Config, ConfigError};
use crate::upload::UploadInfo;

/// Supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    Firebase,
}

impl StoreBackend {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Firebase => "firebase",
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait implemented per storage backend.
///
/// Only invoked when an upload succeeded against the storable destination;
/// the pipeline enforces that precondition.
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Persists one record describing the claim and its upload result.
    async fn store(&self, claim: &ClaimInfo, upload: &UploadInfo) -> Result<(), StoreError>;
}

/// Builds the recorder for the selected backend from configuration.
pub fn build_recorder(
    backend: StoreBackend,
    config: &Config,
) -> Result<Box<dyn Recorder>, ConfigError> {
    Ok(match backend {
        StoreBackend::Firebase => Box::new(FirebaseRecorder::from_config(config)?),
    })
}
