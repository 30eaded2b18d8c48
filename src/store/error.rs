//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur while persisting a record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level error talking to the backend.
    #[error("network error storing record at {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response from the backend.
    #[error("HTTP {status} storing record at {url}")]
    HttpStatus {
        /// The endpoint that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl StoreError {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_http_status_display() {
        let error = StoreError::http_status("https://db.example.com/books.json", 401);
        let msg = error.to_string();
        assert!(msg.contains("401"), "Expected '401' in: {msg}");
        assert!(msg.contains("books.json"), "Expected URL in: {msg}");
    }
}
