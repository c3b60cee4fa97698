//! Error types for file fetches.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching one data file.
///
/// The display strings end up verbatim in the `TransferError` attribute of a
/// result record, so each names the URL or path it concerns.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, broken stream).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing the destination file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The resolved URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The resolved URL has no usable final path segment.
    #[error("cannot derive a local file name from {url}")]
    NoFileName {
        /// The URL with no usable name.
        url: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
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

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a no-file-name error.
    pub fn no_file_name(url: impl Into<String>) -> Self {
        Self::NoFileName { url: url.into() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_url() {
        let error = FetchError::timeout("http://data.example.org/file.gwf");
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "got: {msg}");
        assert!(msg.contains("http://data.example.org/file.gwf"), "got: {msg}");
    }

    #[test]
    fn test_http_status_display_names_code() {
        let error = FetchError::http_status("http://data.example.org/file.gwf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn test_io_display_names_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = FetchError::io(PathBuf::from("/tmp/file.gwf"), io_error);
        assert!(error.to_string().contains("/tmp/file.gwf"));
    }

    #[test]
    fn test_no_file_name_display() {
        let error = FetchError::no_file_name("http://data.example.org/");
        let msg = error.to_string();
        assert!(msg.contains("local file name"), "got: {msg}");
    }
}
