//! Outer guard wrapping one pipeline run.
//!
//! One failure boundary for everything from configuration resolution to
//! the final notification. Operator interruption is caught here and only
//! logged; any other failure produces at most one outbound error
//! notification, with the fixed stage label "global" and no claim or
//! upload details. The notifier is built right after the configuration
//! loads, before any fallible stage, so the error path never touches a
//! value that might not exist yet.

use std::future::Future;
use std::path::Path;

use tracing::{debug, error, info, warn};

use super::{PipelineError, PipelineServices, RunOutcome, RunRequest, run_pipeline};
use crate::claim::SiteClaimer;
use crate::config::{Config, ConfigError};
use crate::notify::{Notifier, build_notifier};
use crate::store::build_recorder;
use crate::upload::build_uploader;

/// Runs one full invocation: config, services, pipeline, error routing.
///
/// Never returns an error; every outcome ends in log output so the caller
/// can unconditionally reach its terminal "done" line.
pub async fn execute(request: &RunRequest, config_path: &Path) {
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(config_error) => {
            debug!(error = ?config_error, "configuration resolution failed");
            error!("could not load configuration: {config_error}");
            return;
        }
    };

    // Built first: the error path below must not depend on anything that
    // can still fail.
    let notifier = match build_optional_notifier(request, &config) {
        Ok(notifier) => notifier,
        Err(config_error) => {
            debug!(error = ?config_error, "notifier construction failed");
            error!("could not set up notification channel: {config_error}");
            return;
        }
    };

    match build_services(request, &config) {
        Ok(mut services) => {
            run_with_shutdown(
                request,
                &mut services,
                notifier.as_deref(),
                tokio::signal::ctrl_c(),
            )
            .await;
        }
        Err(config_error) => {
            report_failure(&PipelineError::Config(config_error), notifier.as_deref()).await;
        }
    }
}

/// Races the pipeline against the shutdown future.
///
/// Interruption is only logged, never notified; a run that finishes first
/// has its outcome routed to the log and, on failure, to [`report_failure`].
async fn run_with_shutdown<F: Future>(
    request: &RunRequest,
    services: &mut PipelineServices,
    notifier: Option<&dyn Notifier>,
    shutdown: F,
) {
    tokio::select! {
        _ = shutdown => {
            error!("interrupted manually");
        }
        result = run_pipeline(request, services, notifier) => {
            match result {
                Ok(RunOutcome::ClaimOnly) => info!("claim-only run complete"),
                Ok(RunOutcome::Completed) => info!("run complete"),
                Err(pipeline_error) => {
                    report_failure(&pipeline_error, notifier).await;
                }
            }
        }
    }
}

fn build_optional_notifier(
    request: &RunRequest,
    config: &Config,
) -> Result<Option<Box<dyn Notifier>>, ConfigError> {
    request
        .notify
        .map(|channel| build_notifier(channel, config))
        .transpose()
}

fn build_services(request: &RunRequest, config: &Config) -> Result<PipelineServices, ConfigError> {
    let claimer = SiteClaimer::from_config(config)?;
    let uploader = request
        .upload
        .map(|service| build_uploader(service, config))
        .transpose()?;
    let recorder = request
        .store
        .map(|backend| build_recorder(backend, config))
        .transpose()?;
    Ok(PipelineServices {
        claimer: Box::new(claimer),
        uploader,
        recorder,
    })
}

/// Routes one failure to the log and, when configured, to the error
/// notification path. One error-level line and at most one notification
/// per run.
async fn report_failure(pipeline_error: &PipelineError, notifier: Option<&dyn Notifier>) {
    debug!(error = ?pipeline_error, "run failed");
    error!("run failed: {pipeline_error}");
    if let Some(notifier) = notifier {
        if let Err(notify_error) = notifier
            .send_error(&pipeline_error.to_string(), "global")
            .await
        {
            warn!(error = %notify_error, "error notification failed");
        }
    }
}
