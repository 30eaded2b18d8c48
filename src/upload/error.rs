//! Error types for the upload module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while transferring files to a destination.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error uploading to {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response from the destination API.
    #[error("HTTP {status} uploading to {url}")]
    HttpStatus {
        /// The endpoint that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while reading a file to upload.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A local path has no usable UTF-8 filename.
    #[error("path has no usable filename: {path}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
    },

    /// A required external tool is not installed.
    #[error("required tool '{program}' not found on PATH")]
    ToolMissing {
        /// The tool that could not be located.
        program: &'static str,
    },

    /// An external tool exited unsuccessfully.
    #[error("'{program}' failed with {status}: {stderr}")]
    ToolFailed {
        /// The tool that failed.
        program: &'static str,
        /// Its exit status.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}

impl UploadError {
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
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_http_status_display() {
        let error = UploadError::http_status("https://api.example.com/upload", 507);
        let msg = error.to_string();
        assert!(msg.contains("507"), "Expected '507' in: {msg}");
        assert!(msg.contains("api.example.com"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_upload_error_tool_failed_display() {
        let error = UploadError::ToolFailed {
            program: "scp",
            status: "exit status: 1".to_string(),
            stderr: "Permission denied".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("scp"), "Expected program in: {msg}");
        assert!(msg.contains("Permission denied"), "Expected stderr in: {msg}");
    }
}
