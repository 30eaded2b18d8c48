//! The run pipeline: claim, download, upload, store, notify.
//!
//! A single run walks a fixed forward sequence of stages, each skippable
//! per request, with no retries and no backward transitions. Every stage
//! failure bubbles to one catch point, the outer guard in [`guard`], which
//! routes it to the error-notification path when a channel is configured.

mod guard;

pub use guard::execute;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::claim::{BookFormat, ClaimError, Claimer};
use crate::config::ConfigError;
use crate::notify::{NotifyChannel, NotifyError, Notifier};
use crate::store::{Recorder, StoreBackend, StoreError};
use crate::upload::{UploadError, UploadInfo, UploadService, Uploader};

/// Resolved options for one invocation.
///
/// Format selection is either the single scalar `format` or, when
/// `all_formats` is set, the full supported list; the CLI enforces the
/// mutual exclusion at parse time.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Log the full claim result for diagnostics.
    pub dev: bool,
    /// Download cover image and source code bundle too.
    pub extras: bool,
    /// Run the (unimplemented) archive stage.
    pub archive: bool,
    /// Stop after the claim; no downloads or transfers.
    pub claim_only: bool,
    /// Single selected format.
    pub format: BookFormat,
    /// Download every supported format instead of `format`.
    pub all_formats: bool,
    /// Upload destination, when uploading at all.
    pub upload: Option<UploadService>,
    /// Storage backend, effective only with a storable upload.
    pub store: Option<StoreBackend>,
    /// Notification channel for success and error paths.
    pub notify: Option<NotifyChannel>,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            dev: false,
            extras: false,
            archive: false,
            claim_only: false,
            format: BookFormat::Pdf,
            all_formats: false,
            upload: None,
            store: None,
            notify: None,
        }
    }
}

/// How a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All requested stages ran.
    Completed,
    /// The run stopped after the claim, as requested.
    ClaimOnly,
}

/// A stage failure that aborts the remainder of the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A selected service is missing configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Claim or download failed.
    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// Upload failed.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Storing the record failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Sending the status notification failed.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// The archive stage was requested but is not implemented.
    #[error("archive stage is not implemented yet")]
    ArchiveUnsupported,
}

/// The collaborators one run drives, built before the first fallible stage.
pub struct PipelineServices {
    /// Claims and downloads the daily book.
    pub claimer: Box<dyn Claimer>,
    /// Upload destination, when one was selected.
    pub uploader: Option<Box<dyn Uploader>>,
    /// Storage backend, when one was selected.
    pub recorder: Option<Box<dyn Recorder>>,
}

/// Resolves the effective format set for a request.
///
/// The full list wins when `all_formats` is set; otherwise the scalar is
/// wrapped in a singleton. Never empty.
#[must_use]
pub fn select_formats(request: &RunRequest) -> Vec<BookFormat> {
    if request.all_formats {
        BookFormat::ALL.to_vec()
    } else {
        vec![request.format]
    }
}

/// Runs the pipeline stages in order.
///
/// Stage failures are not caught here; they propagate to the outer guard.
/// The status notification is sent for claim-only runs too, just without
/// upload details.
pub async fn run_pipeline(
    request: &RunRequest,
    services: &mut PipelineServices,
    notifier: Option<&dyn Notifier>,
) -> Result<RunOutcome, PipelineError> {
    services.claimer.claim().await?;

    if request.dev {
        match serde_json::to_string_pretty(services.claimer.info()) {
            Ok(json) => debug!(claim = %json, "claim result"),
            Err(error) => debug!(error = %error, "claim result not serializable"),
        }
    }

    let mut upload_info: Option<UploadInfo> = None;

    if request.claim_only {
        info!("claim-only run, skipping download and transfer stages");
    } else {
        let formats = select_formats(request);
        services.claimer.download_formats(&formats).await?;

        if request.extras {
            services.claimer.download_extras().await?;
        }

        if request.archive {
            return Err(PipelineError::ArchiveUnsupported);
        }

        if let Some(uploader) = &services.uploader {
            let paths = services.claimer.info().all_paths();
            upload_info = Some(uploader.upload(&paths).await?);
        }

        if let Some(recorder) = &services.recorder {
            match &upload_info {
                Some(upload) if upload.service.is_storable() => {
                    recorder.store(services.claimer.info(), upload).await?;
                }
                _ => warn!("skip store info: missing upload info"),
            }
        }
    }

    if let Some(notifier) = notifier {
        notifier
            .send_status(Some(services.claimer.info()), upload_info.as_ref())
            .await?;
    }

    Ok(if request.claim_only {
        RunOutcome::ClaimOnly
    } else {
        RunOutcome::Completed
    })
}
