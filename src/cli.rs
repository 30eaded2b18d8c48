//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use bookclaim_core::{BookFormat, NotifyChannel, RunRequest, StoreBackend, UploadService};

/// Claim, download, upload and announce the daily free eBook.
///
/// Bookclaim claims the publisher's daily free eBook, optionally downloads
/// the chosen formats and extras, uploads them to a cloud destination,
/// records the transaction, and notifies the operator either way.
#[derive(Parser, Debug)]
#[command(name = "bookclaim")]
#[command(author, version, about)]
pub struct Args {
    /// Configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Development mode: log the full claim result
    #[arg(short, long)]
    pub dev: bool,

    /// Download source code (if it exists) and book cover
    #[arg(short, long)]
    pub extras: bool,

    /// Upload artifacts to a cloud destination
    #[arg(short, long, value_enum)]
    pub upload: Option<UploadService>,

    /// Compress all files (not implemented yet; always aborts the run)
    #[arg(short, long)]
    pub archive: bool,

    /// Notify after claim/download
    #[arg(short, long, value_enum)]
    pub notify: Option<NotifyChannel>,

    /// Store claim/upload info
    #[arg(short, long, value_enum)]
    pub store: Option<StoreBackend>,

    /// Only claim the book (no downloads/uploads)
    #[arg(short = 'o', long = "claim-only")]
    pub claim_only: bool,

    /// eBook format to download
    #[arg(
        short = 't',
        long = "type",
        value_enum,
        default_value_t = BookFormat::Pdf,
        conflicts_with = "all"
    )]
    pub format: BookFormat,

    /// Download every supported format
    #[arg(long)]
    pub all: bool,
}

impl Args {
    /// Resolves the parsed arguments into a pipeline request.
    #[must_use]
    pub fn to_request(&self) -> RunRequest {
        RunRequest {
            dev: self.dev,
            extras: self.extras,
            archive: self.archive,
            claim_only: self.claim_only,
            format: self.format,
            all_formats: self.all,
            upload: self.upload,
            store: self.store,
            notify: self.notify,
        }
    }
}
