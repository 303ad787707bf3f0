//! Document transfer, verification, and file naming.
//!
//! This module turns a resolved document URL into a verified file on disk.
//!
//! # Architecture
//!
//! - [`Fetcher`] - Async trait for the raw byte transport
//! - [`HttpClient`] - Streaming reqwest implementation of [`Fetcher`]
//! - [`verify_file`] - Streaming SHA-256 digest and byte size of a file
//! - [`FetchExecutor`] - Transfer + verify + partial-file cleanup
//! - [`document_file_name`] - Title-derived destination file names
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use harvester_core::download::{FetchExecutor, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = FetchExecutor::new(Arc::new(HttpClient::new()));
//! let verified = executor
//!     .fetch("https://example.com/act.pdf", Path::new("./pdfs/Contract Act.pdf"))
//!     .await?;
//! println!("{} bytes, sha256 {}", verified.size_bytes, verified.digest_hex);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod executor;
mod filename;
mod verify;

pub use client::{FetchSettings, HttpClient};
pub use error::{DownloadError, FetchError, VerifyError};
pub use executor::{FetchExecutor, VerifiedDownload};
pub use filename::{DOCUMENT_EXTENSION, MAX_STEM_CHARS, document_file_name};
pub use verify::{ContentDigest, verify_file};

use std::path::Path;

use async_trait::async_trait;

/// Raw byte transport used by [`FetchExecutor`].
///
/// # Object Safety
///
/// This trait uses `async_trait` so the executor can hold an `Arc<dyn Fetcher>`
/// and tests can substitute an in-memory implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Streams `url` into `destination`, creating or truncating the file.
    ///
    /// Returns the number of bytes written. Non-2xx responses are errors and
    /// must not produce an empty file.
    async fn stream_to(&self, url: &str, destination: &Path) -> Result<u64, DownloadError>;
}
