//! Operator notification channels.
//!
//! One channel handles both outcomes of a run: a status notification after
//! a successful claim (with upload details when an upload occurred) and an
//! error notification carrying the failure message and a stage label.
//! Either info object may be absent; a pre-claim failure has neither.

mod error;
mod gmail;
mod ifttt;
mod join;
pub(crate) mod message;

pub use error::NotifyError;
pub use gmail::GmailNotifier;
pub use ifttt::IftttNotifier;
pub use join::JoinNotifier;

use async_trait::async_trait;

use crate::claim::ClaimInfo;
use crate::config::{Config, ConfigError};
use crate::upload::UploadInfo;

/// Supported notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum NotifyChannel {
    Gmail,
    Ifttt,
    Join,
}

impl NotifyChannel {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Ifttt => "ifttt",
            Self::Join => "join",
        }
    }
}

impl std::fmt::Display for NotifyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait implemented per notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The channel this notifier sends through.
    fn channel(&self) -> NotifyChannel;

    /// Sends the human-readable status for a completed run.
    async fn send_status(
        &self,
        claim: Option<&ClaimInfo>,
        upload: Option<&UploadInfo>,
    ) -> Result<(), NotifyError>;

    /// Sends an error notification with the failing stage's label.
    async fn send_error(&self, error: &str, stage: &str) -> Result<(), NotifyError>;
}

/// Builds the notifier for the selected channel from configuration.
pub fn build_notifier(
    channel: NotifyChannel,
    config: &Config,
) -> Result<Box<dyn Notifier>, ConfigError> {
    Ok(match channel {
        NotifyChannel::Gmail => Box::new(GmailNotifier::from_config(config)?),
        NotifyChannel::Ifttt => Box::new(IftttNotifier::from_config(config)?),
        NotifyChannel::Join => Box::new(JoinNotifier::from_config(config)?),
    })
}
