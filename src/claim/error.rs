//! Error types for the claim module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while claiming or downloading the daily book.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing a downloaded file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The daily offer page did not match the expected layout.
    #[error("could not locate {what} on the daily offer page")]
    PageLayout {
        /// The element that was expected but not found.
        what: &'static str,
    },

    /// A download was requested before a successful claim.
    #[error("no book has been claimed yet")]
    NotClaimed,
}

impl ClaimError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_error_http_status_display() {
        let error = ClaimError::http_status("https://example.com/free-ebook", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected '503' in: {msg}");
        assert!(
            msg.contains("https://example.com/free-ebook"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_claim_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = ClaimError::io(PathBuf::from("/tmp/book.pdf"), io_error);
        assert!(error.to_string().contains("/tmp/book.pdf"));
    }

    #[test]
    fn test_claim_error_page_layout_display() {
        let error = ClaimError::PageLayout { what: "claim form" };
        assert!(error.to_string().contains("claim form"));
    }

    #[test]
    fn test_claim_error_not_claimed_display() {
        assert!(ClaimError::NotClaimed.to_string().contains("claimed"));
    }
}
