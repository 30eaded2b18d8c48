//! Join push notifier.
//!
//! Sends a push through the Join messaging endpoint; title and text travel
//! as query parameters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::error::NotifyError;
use super::message;
use super::{NotifyChannel, Notifier};
use crate::claim::ClaimInfo;
use crate::config::{Config, ConfigError};
use crate::upload::UploadInfo;

const DEFAULT_API_BASE: &str = "https://joinjoaomgcd.appspot.com/_ah/api/messaging/v1";

/// Notifier that sends a push to a Join device.
pub struct JoinNotifier {
    client: Client,
    api_key: String,
    device_id: String,
    api_base: String,
}

impl JoinNotifier {
    /// Builds the notifier from the `[join]` config section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.require("join", "api_key")?,
            config.require("join", "device_id")?,
        ))
    }

    /// Creates a notifier against the production API.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(api_key: impl Into<String>, device_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            api_key: api_key.into(),
            device_id: device_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL (tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn push(&self, title: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/sendPush", self.api_base);
        debug!(device = %self.device_id, "sending join push");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("deviceId", self.device_id.as_str()),
                ("title", title),
                ("text", text),
            ])
            .send()
            .await
            .map_err(|source| NotifyError::network(&url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::http_status(&url, status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for JoinNotifier {
    fn channel(&self) -> NotifyChannel {
        NotifyChannel::Join
    }

    async fn send_status(
        &self,
        claim: Option<&ClaimInfo>,
        upload: Option<&UploadInfo>,
    ) -> Result<(), NotifyError> {
        self.push(
            &message::status_subject(claim),
            &message::status_body(claim, upload),
        )
        .await?;
        info!("status notification sent via join");
        Ok(())
    }

    async fn send_error(&self, error: &str, stage: &str) -> Result<(), NotifyError> {
        self.push(
            &message::error_subject(stage),
            &message::error_body(error, stage),
        )
        .await?;
        info!("error notification sent via join");
        Ok(())
    }
}
