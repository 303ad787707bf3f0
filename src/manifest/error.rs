//! Error types for manifest persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or persisting the manifest.
///
/// Unparsable manifests are not errors: they load as an empty store.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest exists but could not be read.
    #[error("cannot read manifest {path}: {source}")]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The in-memory records could not be serialized.
    #[error("cannot serialize manifest: {source}")]
    Serialize {
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the temp file or renaming it over the manifest failed.
    #[error("cannot write manifest {path}: {source}")]
    Write {
        /// Path that failed (temp file, parent directory, or manifest).
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest path has no file name component.
    #[error("invalid manifest path: {path}")]
    InvalidPath {
        /// Offending path.
        path: PathBuf,
    },
}

impl ManifestError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
