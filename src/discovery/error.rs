//! Error types for page rendering and item discovery.

use thiserror::Error;

/// Errors raised by a [`PageRenderer`](super::PageRenderer) for a single page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The page URL is malformed or not http(s).
    #[error("invalid page URL: {url}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
    },

    /// Page load exceeded the page timeout.
    #[error("timeout loading page {url}")]
    Timeout {
        /// Page URL.
        url: String,
    },

    /// Non-2xx response for the page.
    #[error("HTTP {status} loading page {url}")]
    HttpStatus {
        /// Page URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Connection, TLS, or body decoding failure.
    #[error("network error loading page {url}: {source}")]
    Network {
        /// Page URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The renderer itself could not be initialized.
    #[error("page renderer unavailable: {message}")]
    Unavailable {
        /// Reason.
        message: String,
    },
}

impl RenderError {
    /// Maps a reqwest error, promoting timeouts to [`RenderError::Timeout`].
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unavailable-renderer error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Fatal errors of the discovery phase. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The start page could not be rendered.
    #[error("cannot discover items from {url}: {source}")]
    StartPage {
        /// Start URL.
        url: String,
        /// Renderer failure.
        #[source]
        source: RenderError,
    },

    /// The start page rendered but yielded no usable item links.
    #[error("no item links found on {url} ({candidates} candidate links examined)")]
    NoItems {
        /// Start URL.
        url: String,
        /// Number of raw links the renderer returned.
        candidates: usize,
    },
}
