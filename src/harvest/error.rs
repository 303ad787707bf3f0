//! Fatal coordinator errors.

use thiserror::Error;

use super::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::manifest::ManifestError;

/// Errors that abort a harvest run. Per-item failures never surface here.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    /// The manifest could not be persisted after all items finished.
    #[error("final manifest flush failed: {0}")]
    FinalFlush(#[source] ManifestError),
}
