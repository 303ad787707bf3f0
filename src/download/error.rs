//! Error types for the download module.
//!
//! [`DownloadError`] covers the raw byte transport, [`VerifyError`] the content
//! verifier, and [`FetchError`] the executor that ties both together.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while streaming a remote resource to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, reset, TLS errors, etc.)
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

    /// Non-2xx HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a reqwest error, promoting timeouts to [`DownloadError::Timeout`].
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
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
}

/// Errors raised by the content verifier.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The file is missing or could not be read to the end.
    #[error("cannot verify {path}: {source}")]
    Io {
        /// File being verified.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl VerifyError {
    /// Creates an IO verification error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by [`FetchExecutor::fetch`](super::FetchExecutor::fetch).
///
/// Every variant means the item must not be recorded as downloaded.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Destination directory could not be created.
    #[error("cannot prepare destination {path}: {source}")]
    Prepare {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The transfer itself failed.
    #[error(transparent)]
    Transfer(#[from] DownloadError),

    /// The written file could not be verified.
    #[error("integrity check failed for {url}: {source}")]
    Verify {
        /// Document URL that was fetched.
        url: String,
        /// Verifier failure.
        #[source]
        source: VerifyError,
    },

    /// The verifier observed a different byte count than the transfer wrote.
    #[error(
        "integrity check failed for {path}: transfer wrote {written_bytes} bytes, verifier read {verified_bytes}"
    )]
    SizeMismatch {
        /// Downloaded file.
        path: PathBuf,
        /// Bytes reported by the fetcher.
        written_bytes: u64,
        /// Bytes observed by the verifier.
        verified_bytes: u64,
    },
}

impl FetchError {
    /// Returns true for timeout failures.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transfer(DownloadError::Timeout { .. }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("https://example.com/act.pdf");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/act.pdf"));
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/act.pdf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/act.pdf"));
    }

    #[test]
    fn test_download_error_invalid_url_display() {
        let msg = DownloadError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"));
        assert!(msg.contains("not-a-url"));
    }

    #[test]
    fn test_fetch_error_transfer_is_transparent() {
        let error = FetchError::from(DownloadError::timeout("https://example.com/a.pdf"));
        assert_eq!(error.to_string(), "timeout downloading https://example.com/a.pdf");
        assert!(error.is_timeout());
    }

    #[test]
    fn test_fetch_error_verify_display_names_url_and_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = FetchError::Verify {
            url: "https://example.com/a.pdf".to_string(),
            source: VerifyError::io("/tmp/a.pdf", io_error),
        };
        let msg = error.to_string();
        assert!(msg.contains("integrity check failed"));
        assert!(msg.contains("https://example.com/a.pdf"));
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_fetch_error_size_mismatch_display() {
        let error = FetchError::SizeMismatch {
            path: PathBuf::from("/tmp/a.pdf"),
            written_bytes: 10,
            verified_bytes: 7,
        };
        let msg = error.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains('7'));
    }
}
