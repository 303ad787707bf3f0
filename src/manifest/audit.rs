//! Re-verification of `downloaded` records against the files on disk.

use std::path::PathBuf;

use tracing::{debug, instrument};

use super::record::{ManifestRecord, ManifestStatus};
use super::store::ManifestStore;
use crate::download::{VerifyError, verify_file};

/// Result of checking one `downloaded` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    /// Size and digest match the record.
    Ok,
    /// The file at `localPath` does not exist.
    Missing,
    /// The file exists but its size or digest differs.
    Mismatch {
        /// Size observed on disk.
        actual_size: u64,
        /// Digest observed on disk.
        actual_digest: String,
    },
    /// The record claims `downloaded` without path, size, or digest.
    Incomplete,
    /// The file exists but could not be read.
    Unreadable(String),
}

impl AuditStatus {
    /// Short label used in CLI output.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Missing => "missing",
            Self::Mismatch { .. } => "mismatch",
            Self::Incomplete => "incomplete",
            Self::Unreadable(_) => "unreadable",
        }
    }
}

/// One audited record.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub key: String,
    /// Resolved path that was checked, if the record had one.
    pub path: Option<PathBuf>,
    pub status: AuditStatus,
}

/// Outcome of [`audit_downloads`].
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    /// Number of records that verified.
    #[must_use]
    pub fn ok_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == AuditStatus::Ok)
            .count()
    }

    /// Entries that did not verify.
    pub fn failures(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status != AuditStatus::Ok)
    }

    /// True when every `downloaded` record verified.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Re-hashes every `downloaded` record in `store`.
///
/// Records with other statuses are ignored.
#[instrument(skip_all, fields(manifest = %store.path().display()))]
pub async fn audit_downloads(store: &ManifestStore) -> AuditReport {
    let mut report = AuditReport::default();

    for (key, record) in store.records() {
        if record.status() != ManifestStatus::Downloaded {
            continue;
        }
        let entry = audit_record(store, key, record).await;
        debug!(key = %entry.key, status = entry.status.label(), "audited");
        report.entries.push(entry);
    }

    report
}

async fn audit_record(store: &ManifestStore, key: &str, record: &ManifestRecord) -> AuditEntry {
    let Some((local, size_bytes, digest_hex)) = record.download_evidence() else {
        return AuditEntry {
            key: key.to_string(),
            path: record.local_path().map(|p| store.resolve_local_path(p)),
            status: AuditStatus::Incomplete,
        };
    };

    let path = store.resolve_local_path(local);
    let status = match verify_file(&path).await {
        Ok(digest) if digest.matches(size_bytes, digest_hex) => AuditStatus::Ok,
        Ok(digest) => AuditStatus::Mismatch {
            actual_size: digest.size_bytes,
            actual_digest: digest.digest_hex,
        },
        Err(VerifyError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            AuditStatus::Missing
        }
        Err(error) => AuditStatus::Unreadable(error.to_string()),
    };

    AuditEntry {
        key: key.to_string(),
        path: Some(path),
        status,
    }
}
