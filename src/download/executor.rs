//! Fetch executor: transfer, verify, and clean up.
//!
//! [`FetchExecutor`] is the only path by which a document becomes a
//! [`VerifiedDownload`]. A transfer that cannot be verified leaves no file
//! behind and never yields a success value.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::Fetcher;
use super::error::FetchError;
use super::verify::verify_file;

/// A document that was written to disk and re-read successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedDownload {
    /// Absolute or caller-relative destination path.
    pub path: PathBuf,
    /// Verified byte size.
    pub size_bytes: u64,
    /// Verified lower-case hex SHA-256.
    pub digest_hex: String,
}

/// Runs a transfer through a [`Fetcher`] and verifies the result.
#[derive(Clone)]
pub struct FetchExecutor {
    fetcher: Arc<dyn Fetcher>,
}

impl std::fmt::Debug for FetchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchExecutor").finish_non_exhaustive()
    }
}

impl FetchExecutor {
    /// Creates an executor over the given fetcher.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Downloads `document_url` to `destination` and verifies the written bytes.
    ///
    /// The destination's parent directory is created if needed and an existing
    /// file is overwritten.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Prepare`] if the destination directory cannot be created
    /// - [`FetchError::Transfer`] on timeout, non-2xx status, network or write failure
    /// - [`FetchError::Verify`] if the written file cannot be re-read
    /// - [`FetchError::SizeMismatch`] if the verifier sees a different byte count
    #[instrument(skip(self), fields(destination = %destination.display()))]
    pub async fn fetch(
        &self,
        document_url: &str,
        destination: &Path,
    ) -> Result<VerifiedDownload, FetchError> {
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Prepare {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let written_bytes = match self.fetcher.stream_to(document_url, destination).await {
            Ok(bytes) => bytes,
            Err(error) => {
                remove_partial(destination).await;
                return Err(FetchError::Transfer(error));
            }
        };

        let digest = match verify_file(destination).await {
            Ok(digest) => digest,
            Err(source) => {
                remove_partial(destination).await;
                return Err(FetchError::Verify {
                    url: document_url.to_string(),
                    source,
                });
            }
        };

        if digest.size_bytes != written_bytes {
            remove_partial(destination).await;
            return Err(FetchError::SizeMismatch {
                path: destination.to_path_buf(),
                written_bytes,
                verified_bytes: digest.size_bytes,
            });
        }

        debug!(
            size_bytes = digest.size_bytes,
            digest = %digest.digest_hex,
            "download verified"
        );

        Ok(VerifiedDownload {
            path: destination.to_path_buf(),
            size_bytes: digest.size_bytes,
            digest_hex: digest.digest_hex,
        })
    }
}

/// Best-effort removal of a file that must not be mistaken for a good download.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            warn!(path = %path.display(), error = %error, "could not remove partial file");
        }
    }
}
