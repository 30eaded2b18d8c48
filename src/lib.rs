//! Bookclaim Core Library
//!
//! This library provides the core functionality for the bookclaim tool,
//! which claims the daily free promotional eBook, downloads the chosen
//! formats (plus optional extras), uploads the artifacts to a cloud
//! destination, records the transaction, and notifies the operator.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Sectioned credential/configuration file loading
//! - [`claim`] - Claimer interface and the HTTP site implementation
//! - [`upload`] - Upload destinations (cloud drive, file sync, remote copy)
//! - [`store`] - Persistence of claim/upload records
//! - [`notify`] - Operator notification channels
//! - [`pipeline`] - The run pipeline state machine and its outer guard

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod claim;
pub mod config;
pub mod notify;
pub mod pipeline;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use claim::{AssetKind, BookFormat, ClaimError, ClaimInfo, Claimer, SiteClaimer};
pub use config::{Config, ConfigError};
pub use notify::{NotifyChannel, NotifyError, Notifier, build_notifier};
pub use pipeline::{
    PipelineError, PipelineServices, RunOutcome, RunRequest, run_pipeline, select_formats,
};
pub use store::{Recorder, StoreBackend, StoreError, build_recorder};
pub use upload::{
    UploadError, UploadInfo, UploadService, UploadedArtifact, Uploader, build_uploader,
};
