//! HTTP implementation of the [`Claimer`] trait.
//!
//! Drives a cookie-backed session against the publisher's site: log in,
//! fetch the daily offer page, claim the offered book, then stream the
//! requested files to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use regex::Regex;
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use super::error::ClaimError;
use super::{AssetKind, BookFormat, ClaimInfo, Claimer};

/// Connect timeout for all site requests.
const CONNECT_TIMEOUT_SECS: u64 = 30;
/// Read timeout; generous because eBook downloads can be large.
const READ_TIMEOUT_SECS: u64 = 300;

/// Settings for talking to the publisher's site.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Site base URL, without a trailing slash.
    pub base_url: String,
    /// Account email used to log in.
    pub email: String,
    /// Account password used to log in.
    pub password: String,
    /// Directory downloaded files are written into.
    pub download_dir: PathBuf,
}

/// Claimer backed by the publisher's website.
///
/// Holds a cookie session across login, claim, and download requests.
pub struct SiteClaimer {
    client: Client,
    settings: SiteSettings,
    info: ClaimInfo,
    claimed: bool,
}

impl SiteClaimer {
    /// Builds the claimer from the `[claim]` config section.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, crate::config::ConfigError> {
        Ok(Self::new(SiteSettings {
            base_url: config.require("claim", "base_url")?.to_string(),
            email: config.require("claim", "email")?.to_string(),
            password: config.require("claim", "password")?.to_string(),
            download_dir: PathBuf::from(config.get("claim", "download_dir").unwrap_or("books")),
        }))
    }

    /// Creates a claimer with a fresh cookie session.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(settings: SiteSettings) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            settings,
            info: ClaimInfo::default(),
            claimed: false,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_url.trim_end_matches('/'))
    }

    async fn get_text(&self, url: &str) -> Result<String, ClaimError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ClaimError::network(url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::http_status(url, status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|source| ClaimError::network(url, source))
    }

    async fn login(&self) -> Result<(), ClaimError> {
        let url = self.endpoint("/login");
        debug!(url = %url, "logging in");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("email", self.settings.email.as_str()),
                ("password", self.settings.password.as_str()),
            ])
            .send()
            .await
            .map_err(|source| ClaimError::network(&url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::http_status(&url, status.as_u16()));
        }
        Ok(())
    }

    /// Extracts today's offer from the daily free-ebook page.
    fn parse_offer(page: &str) -> Result<ClaimInfo, ClaimError> {
        // The claim form carries the book id the download endpoints need.
        let book_id = capture(page, r#"freelearning-claim/(\d+)"#)
            .ok_or(ClaimError::PageLayout { what: "claim form" })?;
        let title = capture(page, r#"dotd-title[^>]*>\s*<h2[^>]*>([^<]+)</h2>"#)
            .map(|raw| raw.trim().to_string())
            .ok_or(ClaimError::PageLayout { what: "book title" })?;
        let description = capture(page, r#"dotd-main-book-summary[^>]*>\s*<div[^>]*>([^<]+)<"#)
            .map(|raw| raw.trim().to_string());
        let cover_url = capture(page, r#"dotd-main-book-image[^>]*>\s*<[^>]*src="([^"]+)""#);
        let source_code_url = capture(page, r#"href="([^"]+/code_download/[^"]+)""#);

        Ok(ClaimInfo {
            title,
            book_id,
            description,
            cover_url,
            source_code_url,
            paths: std::collections::BTreeMap::new(),
        })
    }

    /// Streams the body of `url` into `download_dir/filename`.
    async fn download_to_file(&self, url: &str, filename: &str) -> Result<PathBuf, ClaimError> {
        let dir = &self.settings.download_dir;
        fs::create_dir_all(dir)
            .await
            .map_err(|source| ClaimError::io(dir.clone(), source))?;
        let path = dir.join(filename);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ClaimError::network(url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::http_status(url, status.as_u16()));
        }

        let file = File::create(&path)
            .await
            .map_err(|source| ClaimError::io(path.clone(), source))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| ClaimError::network(url, source))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|source| ClaimError::io(path.clone(), source))?;
        }
        writer
            .flush()
            .await
            .map_err(|source| ClaimError::io(path.clone(), source))?;

        debug!(path = %path.display(), "downloaded file");
        Ok(path)
    }

    fn file_stem(&self) -> String {
        sanitize_title(&self.info.title)
    }
}

#[async_trait]
impl Claimer for SiteClaimer {
    async fn claim(&mut self) -> Result<(), ClaimError> {
        self.login().await?;

        let offer_url = self.endpoint("/free-learning");
        let page = self.get_text(&offer_url).await?;
        self.info = Self::parse_offer(&page)?;

        let claim_url = self.endpoint(&format!("/freelearning-claim/{}", self.info.book_id));
        debug!(url = %claim_url, "claiming daily offer");
        let response = self
            .client
            .post(&claim_url)
            .send()
            .await
            .map_err(|source| ClaimError::network(&claim_url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::http_status(&claim_url, status.as_u16()));
        }

        self.claimed = true;
        info!(title = %self.info.title, "book successfully claimed");
        Ok(())
    }

    async fn download_formats(&mut self, formats: &[BookFormat]) -> Result<(), ClaimError> {
        if !self.claimed {
            return Err(ClaimError::NotClaimed);
        }

        let stem = self.file_stem();
        for &format in formats {
            let url = self.endpoint(&format!(
                "/ebook_download/{}/{}",
                self.info.book_id,
                format.as_str()
            ));
            let filename = format!("{stem}.{}", format.as_str());
            info!(format = %format, "downloading ebook");
            let path = self.download_to_file(&url, &filename).await?;
            self.info.add_path(AssetKind::Format(format), path);
        }
        Ok(())
    }

    async fn download_extras(&mut self) -> Result<(), ClaimError> {
        if !self.claimed {
            return Err(ClaimError::NotClaimed);
        }

        let stem = self.file_stem();
        if let Some(cover_url) = self.info.cover_url.clone() {
            let extension = extension_from_url(&cover_url).unwrap_or("jpg");
            info!("downloading cover image");
            let path = self
                .download_to_file(&cover_url, &format!("{stem}.{extension}"))
                .await?;
            self.info.add_path(AssetKind::Cover, path);
        } else {
            debug!("offer has no cover image");
        }

        if let Some(code_url) = self.info.source_code_url.clone() {
            info!("downloading source code archive");
            let path = self
                .download_to_file(&code_url, &format!("{stem}.zip"))
                .await?;
            self.info.add_path(AssetKind::SourceCode, path);
        } else {
            debug!("offer has no source code archive");
        }
        Ok(())
    }

    fn info(&self) -> &ClaimInfo {
        &self.info
    }
}

/// Returns the first capture group of `pattern` in `text`, if any.
///
/// Invalid patterns are a programmer error; all call sites use literals.
fn capture(text: &str, pattern: &str) -> Option<String> {
    let regex = Regex::new(pattern).ok()?;
    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().to_string())
}

/// Turns a book title into a safe filename stem.
fn sanitize_title(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let collapsed: String = stem.split('_').filter(|part| !part.is_empty()).collect::<Vec<_>>().join("_");
    if collapsed.is_empty() {
        "book".to_string()
    } else {
        collapsed
    }
}

/// Extension of the final path segment of a URL, when it has one.
fn extension_from_url(url: &str) -> Option<&'static str> {
    let path = url::Url::parse(url).ok()?;
    let last = path.path_segments()?.next_back()?.to_ascii_lowercase();
    match Path::new(&last).extension()?.to_str()? {
        "png" => Some("png"),
        "gif" => Some("gif"),
        "jpeg" | "jpg" => Some("jpg"),
        _ => None,
    }
}
