//! Claiming and downloading the daily free eBook.
//!
//! This module defines the [`Claimer`] interface the run pipeline consumes,
//! the [`ClaimInfo`] result object it produces, and the reqwest-backed
//! [`SiteClaimer`] implementation that talks to the publisher's site.
//!
//! # Architecture
//!
//! - [`Claimer`] - Async trait for claim/download operations
//! - [`ClaimInfo`] - Claimed-item metadata plus downloaded file paths
//! - [`BookFormat`] / [`AssetKind`] - Typed identifiers for downloadable assets
//! - [`SiteClaimer`] - HTTP implementation with a cookie-backed session

mod error;
mod site;

pub use error::ClaimError;
pub use site::{SiteClaimer, SiteSettings};

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

/// Supported eBook formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Pdf,
    Epub,
    Mobi,
}

impl BookFormat {
    /// Every supported format, in the canonical download order.
    pub const ALL: [BookFormat; 3] = [BookFormat::Pdf, BookFormat::Epub, BookFormat::Mobi];

    /// Returns the stable lowercase label used in URLs and filenames.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
            Self::Mobi => "mobi",
        }
    }
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A downloadable asset: one of the eBook formats or an extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetKind {
    /// The eBook itself in a specific format.
    Format(BookFormat),
    /// The cover image.
    Cover,
    /// The bundled source code archive.
    SourceCode,
}

impl AssetKind {
    /// Returns the stable label used as the path-map key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Format(format) => format.as_str(),
            Self::Cover => "cover",
            Self::SourceCode => "code",
        }
    }
}

impl Serialize for AssetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result object produced by a [`Claimer`].
///
/// Created at claim time and treated as read-only by every downstream
/// stage; only the claimer itself appends to `paths` as downloads land.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClaimInfo {
    /// Title of today's claimed book.
    pub title: String,
    /// Site identifier of the claimed book (used in download URLs).
    pub book_id: String,
    /// Short description from the offer page, when present.
    pub description: Option<String>,
    /// URL of the cover image, when present.
    pub cover_url: Option<String>,
    /// URL of the bundled source code archive, when present.
    pub source_code_url: Option<String>,
    /// Local file paths per downloaded asset.
    pub paths: BTreeMap<AssetKind, Vec<PathBuf>>,
}

impl ClaimInfo {
    /// Records a downloaded file under the given asset kind.
    pub fn add_path(&mut self, kind: AssetKind, path: PathBuf) {
        self.paths.entry(kind).or_default().push(path);
    }

    /// All downloaded file paths, flattened in asset order.
    #[must_use]
    pub fn all_paths(&self) -> Vec<PathBuf> {
        self.paths.values().flatten().cloned().collect()
    }

    /// True once at least one file has been downloaded.
    #[must_use]
    pub fn has_downloads(&self) -> bool {
        self.paths.values().any(|paths| !paths.is_empty())
    }
}

/// Trait for claiming the daily free book and materializing its files.
///
/// # Object Safety
///
/// Uses `async_trait` so the pipeline can hold a `Box<dyn Claimer>` and
/// tests can substitute mock implementations.
#[async_trait]
pub trait Claimer: Send + Sync {
    /// Claims today's free book, populating the claim metadata.
    async fn claim(&mut self) -> Result<(), ClaimError>;

    /// Downloads the requested formats, appending to the path map.
    async fn download_formats(&mut self, formats: &[BookFormat]) -> Result<(), ClaimError>;

    /// Downloads the extras (cover image, source code archive).
    async fn download_extras(&mut self) -> Result<(), ClaimError>;

    /// The claim result accumulated so far.
    fn info(&self) -> &ClaimInfo;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_book_format_all_contains_every_variant_once() {
        assert_eq!(BookFormat::ALL.len(), 3);
        assert_eq!(
            BookFormat::ALL,
            [BookFormat::Pdf, BookFormat::Epub, BookFormat::Mobi]
        );
    }

    #[test]
    fn test_book_format_labels() {
        assert_eq!(BookFormat::Pdf.as_str(), "pdf");
        assert_eq!(BookFormat::Epub.as_str(), "epub");
        assert_eq!(BookFormat::Mobi.as_str(), "mobi");
    }

    #[test]
    fn test_asset_kind_labels() {
        assert_eq!(AssetKind::Format(BookFormat::Epub).as_str(), "epub");
        assert_eq!(AssetKind::Cover.as_str(), "cover");
        assert_eq!(AssetKind::SourceCode.as_str(), "code");
    }

    #[test]
    fn test_claim_info_add_path_groups_by_kind() {
        let mut info = ClaimInfo::default();
        info.add_path(AssetKind::Format(BookFormat::Pdf), PathBuf::from("a.pdf"));
        info.add_path(AssetKind::Format(BookFormat::Pdf), PathBuf::from("b.pdf"));
        info.add_path(AssetKind::Cover, PathBuf::from("cover.jpg"));

        assert_eq!(
            info.paths.get(&AssetKind::Format(BookFormat::Pdf)).unwrap().len(),
            2
        );
        assert_eq!(info.all_paths().len(), 3);
        assert!(info.has_downloads());
    }

    #[test]
    fn test_claim_info_empty_has_no_downloads() {
        let info = ClaimInfo::default();
        assert!(!info.has_downloads());
        assert!(info.all_paths().is_empty());
    }

    #[test]
    fn test_claim_info_serializes_paths_with_string_keys() {
        let mut info = ClaimInfo {
            title: "Test Book".to_string(),
            ..ClaimInfo::default()
        };
        info.add_path(AssetKind::Format(BookFormat::Pdf), PathBuf::from("t.pdf"));

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["title"], "Test Book");
        assert_eq!(json["paths"]["pdf"][0], "t.pdf");
    }
}
