//! Terminal states of the per-item state machine.

use std::fmt;
use std::path::PathBuf;

/// How an item finished within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A verified download was already on disk. No network, no manifest write.
    Skipped,
    /// The item page links to no document.
    NoDocument,
    /// The item page could not be resolved.
    ResolutionFailed {
        /// Renderer error text.
        message: String,
    },
    /// The document was fetched and verified.
    Downloaded {
        /// Destination path.
        path: PathBuf,
        /// Verified size.
        size_bytes: u64,
    },
    /// The transfer or verification failed.
    FetchFailed {
        /// Executor error text.
        message: String,
    },
}

impl ItemOutcome {
    /// Short label used in progress lines.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::NoDocument => "no document",
            Self::ResolutionFailed { .. } => "resolution failed",
            Self::Downloaded { .. } => "downloaded",
            Self::FetchFailed { .. } => "download failed",
        }
    }

    /// True for the two failure states.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailed { .. } | Self::FetchFailed { .. }
        )
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolutionFailed { message } | Self::FetchFailed { message } => {
                write!(f, "{}: {message}", self.label())
            }
            Self::Downloaded { path, size_bytes } => {
                write!(f, "{} {} ({size_bytes} bytes)", self.label(), path.display())
            }
            Self::Skipped | Self::NoDocument => f.write_str(self.label()),
        }
    }
}
