//! IFTTT maker-webhook notifier.
//!
//! Triggers the configured event with `value1` = subject, `value2` = body,
//! `value3` = first shareable link when an upload occurred.

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

const DEFAULT_API_BASE: &str = "https://maker.ifttt.com";

/// Notifier that triggers an IFTTT maker-webhook event.
pub struct IftttNotifier {
    client: Client,
    key: String,
    event: String,
    api_base: String,
}

impl IftttNotifier {
    /// Builds the notifier from the `[ifttt]` config section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.require("ifttt", "key")?,
            config.require("ifttt", "event")?,
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
    pub fn new(key: impl Into<String>, event: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            key: key.into(),
            event: event.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL (tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn trigger(
        &self,
        value1: &str,
        value2: &str,
        value3: Option<&str>,
    ) -> Result<(), NotifyError> {
        let url = format!(
            "{}/trigger/{}/with/key/{}",
            self.api_base, self.event, self.key
        );
        let mut payload = serde_json::json!({ "value1": value1, "value2": value2 });
        if let Some(value3) = value3 {
            payload["value3"] = serde_json::json!(value3);
        }
        debug!(event = %self.event, "triggering ifttt event");

        let response = self
            .client
            .post(&url)
            .json(&payload)
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
impl Notifier for IftttNotifier {
    fn channel(&self) -> NotifyChannel {
        NotifyChannel::Ifttt
    }

    async fn send_status(
        &self,
        claim: Option<&ClaimInfo>,
        upload: Option<&UploadInfo>,
    ) -> Result<(), NotifyError> {
        let subject = message::status_subject(claim);
        let body = message::status_body(claim, upload);
        let link = upload.and_then(|upload| upload.links().first().map(|link| (*link).to_string()));
        self.trigger(&subject, &body, link.as_deref()).await?;
        info!("status notification sent via ifttt");
        Ok(())
    }

    async fn send_error(&self, error: &str, stage: &str) -> Result<(), NotifyError> {
        self.trigger(
            &message::error_subject(stage),
            &message::error_body(error, stage),
            None,
        )
        .await?;
        info!("error notification sent via ifttt");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ifttt_status_hits_event_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trigger/book_claimed/with/key/k-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = IftttNotifier::new("k-1", "book_claimed").with_api_base(server.uri());
        notifier.send_status(None, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_ifttt_error_payload_carries_stage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "value1": "Book claim failed (global)"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = IftttNotifier::new("k-1", "book_claimed").with_api_base(server.uri());
        notifier.send_error("boom", "global").await.unwrap();
    }

    #[tokio::test]
    async fn test_ifttt_maps_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let notifier = IftttNotifier::new("bad", "book_claimed").with_api_base(server.uri());
        let error = notifier.send_error("boom", "global").await.unwrap_err();
        assert!(matches!(error, NotifyError::HttpStatus { status: 401, .. }));
    }
}
