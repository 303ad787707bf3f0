//! Provenance manifest: one record per item key, persisted as a JSON object.
//!
//! # Architecture
//!
//! - [`ManifestRecord`] / [`ManifestStatus`] - Persisted outcome of an item
//! - [`ManifestStore`] - Lenient load, upsert, skip check, atomic flush
//! - [`SharedManifest`] - Single-writer handle; `commit` = upsert + flush under one lock
//! - [`audit_downloads`] - Re-hash every `downloaded` record against disk

mod audit;
mod error;
mod record;
mod store;

pub use audit::{AuditEntry, AuditReport, AuditStatus, audit_downloads};
pub use error::ManifestError;
pub use record::{ManifestRecord, ManifestStatus};
pub use store::{CORRUPT_BACKUP_SUFFIX, ManifestStore, SharedManifest};
