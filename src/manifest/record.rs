//! Manifest record and status definitions.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::discovery::Item;
use crate::download::VerifiedDownload;

/// Persisted outcome of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestStatus {
    /// Document fetched and verified.
    Downloaded,
    /// The item page had no document link.
    NoDocumentFound,
    /// A document URL was found but the transfer or verification failed.
    DownloadError,
    /// The item page could not be resolved, or the task failed unexpectedly.
    Error,
}

impl ManifestStatus {
    /// Returns the serialized string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloaded => "downloaded",
            Self::NoDocumentFound => "no-document-found",
            Self::DownloadError => "download-error",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ManifestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "downloaded" => Ok(Self::Downloaded),
            "no-document-found" => Ok(Self::NoDocumentFound),
            "download-error" => Ok(Self::DownloadError),
            "error" => Ok(Self::Error),
            _ => Err(format!("invalid manifest status: {s}")),
        }
    }
}

/// The last known outcome of one item.
///
/// Fields are private: a `downloaded` record can only be built from a
/// [`VerifiedDownload`], so path, size, and digest are always present together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    status: ManifestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    digest_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    timestamp: DateTime<Utc>,
}

impl ManifestRecord {
    fn base(status: ManifestStatus, item: &Item) -> Self {
        Self {
            status,
            title: Some(item.title.clone()),
            source_page_url: Some(item.source_page_url.clone()),
            document_url: None,
            local_path: None,
            size_bytes: None,
            digest_hex: None,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// Record for a verified download.
    ///
    /// `local_path` is stored as given; callers pass it relative to the project root.
    #[must_use]
    pub fn downloaded(
        item: &Item,
        document_url: &str,
        local_path: PathBuf,
        download: &VerifiedDownload,
    ) -> Self {
        Self {
            document_url: Some(document_url.to_string()),
            local_path: Some(local_path),
            size_bytes: Some(download.size_bytes),
            digest_hex: Some(download.digest_hex.clone()),
            ..Self::base(ManifestStatus::Downloaded, item)
        }
    }

    /// Record for an item page without a document link.
    #[must_use]
    pub fn no_document(item: &Item) -> Self {
        Self::base(ManifestStatus::NoDocumentFound, item)
    }

    /// Record for a failed transfer of a resolved document.
    #[must_use]
    pub fn download_error(item: &Item, document_url: &str, message: impl Into<String>) -> Self {
        Self {
            document_url: Some(document_url.to_string()),
            error_message: Some(message.into()),
            ..Self::base(ManifestStatus::DownloadError, item)
        }
    }

    /// Record for a resolution failure or an aborted task.
    #[must_use]
    pub fn failed(item: &Item, document_url: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            document_url: document_url.map(str::to_string),
            error_message: Some(message.into()),
            ..Self::base(ManifestStatus::Error, item)
        }
    }

    #[must_use]
    pub fn status(&self) -> ManifestStatus {
        self.status
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn source_page_url(&self) -> Option<&str> {
        self.source_page_url.as_deref()
    }

    #[must_use]
    pub fn document_url(&self) -> Option<&str> {
        self.document_url.as_deref()
    }

    /// Stored path, relative to the project root when it lies under it.
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }

    #[must_use]
    pub fn digest_hex(&self) -> Option<&str> {
        self.digest_hex.as_deref()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns path, size, and digest when this is a complete `downloaded` record.
    ///
    /// Records loaded from a hand-edited manifest may claim `downloaded` without
    /// the evidence; those return `None`.
    #[must_use]
    pub fn download_evidence(&self) -> Option<(&Path, u64, &str)> {
        if self.status != ManifestStatus::Downloaded {
            return None;
        }
        Some((
            self.local_path.as_deref()?,
            self.size_bytes?,
            self.digest_hex.as_deref()?,
        ))
    }
}
