//! Statute Harvester Core Library
//!
//! Resumable, idempotent fetch-and-record pipeline for statute PDFs: discover
//! item pages, resolve each to its document, download and verify it, and keep
//! a provenance manifest that makes re-runs skip completed work.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`discovery`] - Page renderer trait, static-HTML renderer, item discovery
//! - [`download`] - Streaming fetcher, content verifier, fetch executor, file naming
//! - [`manifest`] - JSON provenance manifest with atomic flush and single-writer handle
//! - [`harvest`] - Semaphore-bounded coordinator and per-item state machine
//! - [`error_log`] - Append-only timestamped failure log

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod discovery;
pub mod download;
pub mod error_log;
pub mod harvest;
pub mod manifest;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use discovery::{
    CandidateLink, DiscoveryError, DiscoveryOptions, HttpPageRenderer, Item, PageRenderer,
    RenderError, RendererSettings, discover_items,
};
pub use download::{
    ContentDigest, DownloadError, FetchError, FetchExecutor, FetchSettings, Fetcher, HttpClient,
    VerifiedDownload, VerifyError, document_file_name, verify_file,
};
pub use error_log::ErrorLog;
pub use harvest::{
    DEFAULT_CONCURRENCY, HarvestConfig, HarvestError, HarvestStats, HarvestSummary, Harvester,
    ItemOutcome,
};
pub use manifest::{
    AuditReport, AuditStatus, ManifestError, ManifestRecord, ManifestStatus, ManifestStore,
    SharedManifest, audit_downloads,
};
