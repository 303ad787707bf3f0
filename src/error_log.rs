//! Append-only, timestamped error log.
//!
//! The manifest is authoritative; this log is a diagnostic trail. Appends never
//! fail the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

/// Timestamp format of each line prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shared handle to the error log file.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl ErrorLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `[<local timestamp>] <message>` as one line.
    ///
    /// Failures are reported through `tracing` and otherwise discarded.
    pub async fn append(&self, message: &str) {
        if let Err(error) = self.try_append(message).await {
            warn!(
                path = %self.path.display(),
                error = %error,
                "could not append to error log"
            );
        }
    }

    /// Fallible form of [`ErrorLog::append`].
    ///
    /// # Errors
    ///
    /// Returns the IO error from creating the parent directory, opening, or writing the file.
    pub async fn try_append(&self, message: &str) -> std::io::Result<()> {
        let line = format_line(message);
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

fn format_line(message: &str) -> String {
    // Embedded newlines would break the one-line-per-error format.
    let single_line = message.replace(['\r', '\n'], " ");
    format!("[{}] {single_line}\n", Local::now().format(TIMESTAMP_FORMAT))
}
