//! Streaming content verification (SHA-256 digest and byte size).

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use super::constants::VERIFY_CHUNK_BYTES;
use super::error::VerifyError;

/// Size and digest observed while reading a file end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    /// Number of bytes read.
    pub size_bytes: u64,
    /// Lower-case hex SHA-256 of the content.
    pub digest_hex: String,
}

impl ContentDigest {
    /// Returns true when both size and digest match. Digest comparison ignores case.
    #[must_use]
    pub fn matches(&self, size_bytes: u64, digest_hex: &str) -> bool {
        self.size_bytes == size_bytes && self.digest_hex.eq_ignore_ascii_case(digest_hex)
    }
}

/// Computes the SHA-256 digest and byte size of a file.
///
/// Reads in fixed chunks, so memory use does not grow with file size.
///
/// # Errors
///
/// Returns [`VerifyError::Io`] if the file is missing or a read fails mid-stream.
#[instrument(fields(path = %path.display()))]
pub async fn verify_file(path: &Path) -> Result<ContentDigest, VerifyError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| VerifyError::io(path, e))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; VERIFY_CHUNK_BYTES];
    let mut size_bytes: u64 = 0;

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .map_err(|e| VerifyError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        size_bytes += n as u64;
    }

    let digest_hex = format!("{:x}", hasher.finalize());
    debug!(size_bytes, digest = %digest_hex, "content verified");

    Ok(ContentDigest {
        size_bytes,
        digest_hex,
    })
}
