//! Gmail notifier.
//!
//! Sends mail through the Gmail REST API: the RFC 2822 message is
//! assembled locally and posted base64url-encoded as the `raw` field.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use tracing::{debug, info};

use super::error::NotifyError;
use super::message;
use super::{NotifyChannel, Notifier};
use crate::claim::ClaimInfo;
use crate::config::{Config, ConfigError};
use crate::upload::UploadInfo;

const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Notifier that sends mail via the Gmail API.
pub struct GmailNotifier {
    client: Client,
    access_token: String,
    from: String,
    to: String,
    api_base: String,
}

impl GmailNotifier {
    /// Builds the notifier from the `[gmail]` config section.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.require("gmail", "access_token")?,
            config.require("gmail", "from")?,
            config.require("gmail", "to")?,
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
    pub fn new(
        access_token: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            access_token: access_token.into(),
            from: from.into(),
            to: to.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL (tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Assembles the base64url-encoded RFC 2822 message.
    fn encode_message(&self, subject: &str, body: &str) -> String {
        let raw = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
            self.from, self.to, subject, body
        );
        URL_SAFE_NO_PAD.encode(raw)
    }

    async fn send_mail(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/users/me/messages/send", self.api_base);
        let payload = serde_json::json!({ "raw": self.encode_message(subject, body) });
        debug!(to = %self.to, "sending gmail message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
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
impl Notifier for GmailNotifier {
    fn channel(&self) -> NotifyChannel {
        NotifyChannel::Gmail
    }

    async fn send_status(
        &self,
        claim: Option<&ClaimInfo>,
        upload: Option<&UploadInfo>,
    ) -> Result<(), NotifyError> {
        self.send_mail(
            &message::status_subject(claim),
            &message::status_body(claim, upload),
        )
        .await?;
        info!("status notification sent via gmail");
        Ok(())
    }

    async fn send_error(&self, error: &str, stage: &str) -> Result<(), NotifyError> {
        self.send_mail(
            &message::error_subject(stage),
            &message::error_body(error, stage),
        )
        .await?;
        info!("error notification sent via gmail");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_encode_message_roundtrips_headers_and_body() {
        let notifier = GmailNotifier::new("tok", "bot@example.com", "me@example.com");
        let encoded = notifier.encode_message("Book claimed: X", "hello");
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(encoded).unwrap()).unwrap();
        assert!(decoded.starts_with("From: bot@example.com\r\n"));
        assert!(decoded.contains("Subject: Book claimed: X\r\n"));
        assert!(decoded.ends_with("\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn test_gmail_send_posts_to_messages_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            GmailNotifier::new("tok", "bot@example.com", "me@example.com").with_api_base(server.uri());
        notifier.send_status(None, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_gmail_maps_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let notifier =
            GmailNotifier::new("tok", "bot@example.com", "me@example.com").with_api_base(server.uri());
        let error = notifier.send_error("boom", "global").await.unwrap_err();
        assert!(matches!(error, NotifyError::HttpStatus { status: 403, .. }));
    }
}
