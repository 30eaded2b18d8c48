//! Firebase realtime-database recorder.
//!
//! POSTs one JSON record per run to `{base}/books.json`, authenticated
//! with the database secret as a query parameter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::error::StoreError;
use super::Recorder;
use crate::claim::ClaimInfo;
use crate::config::{Config, ConfigError};
use crate::upload::UploadInfo;

/// The record persisted per claimed book.
#[derive(Debug, Serialize)]
struct BookRecord<'a> {
    title: &'a str,
    description: Option<&'a str>,
    cover_url: Option<&'a str>,
    upload_service: &'a str,
    links: Vec<&'a str>,
    stored_at: String,
}

/// Recorder backed by a Firebase realtime database.
pub struct FirebaseRecorder {
    client: Client,
    base_url: String,
    secret: String,
}

impl FirebaseRecorder {
    /// Builds the recorder from the `[firebase]` config section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.require("firebase", "base_url")?,
            config.require("firebase", "secret")?,
        ))
    }

    /// Creates a recorder for the given database.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/books.json", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Recorder for FirebaseRecorder {
    async fn store(&self, claim: &ClaimInfo, upload: &UploadInfo) -> Result<(), StoreError> {
        let url = self.endpoint();
        let record = BookRecord {
            title: &claim.title,
            description: claim.description.as_deref(),
            cover_url: claim.cover_url.as_deref(),
            upload_service: upload.service.as_str(),
            links: upload.links(),
            stored_at: Utc::now().to_rfc3339(),
        };
        debug!(title = %claim.title, "storing claim record");

        let response = self
            .client
            .post(&url)
            .query(&[("auth", self.secret.as_str())])
            .json(&record)
            .send()
            .await
            .map_err(|source| StoreError::network(&url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::http_status(&url, status.as_u16()));
        }

        info!(title = %claim.title, "claim record stored");
        Ok(())
    }
}
