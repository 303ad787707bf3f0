//! Run statistics shared by concurrent item tasks.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::ItemOutcome;

/// Per-outcome counters, updated atomically from worker tasks.
#[derive(Debug, Default)]
pub struct HarvestStats {
    skipped: AtomicUsize,
    downloaded: AtomicUsize,
    no_document: AtomicUsize,
    resolution_failed: AtomicUsize,
    fetch_failed: AtomicUsize,
    aborted: AtomicUsize,
}

impl HarvestStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one terminal outcome.
    pub fn record(&self, outcome: &ItemOutcome) {
        let counter = match outcome {
            ItemOutcome::Skipped => &self.skipped,
            ItemOutcome::Downloaded { .. } => &self.downloaded,
            ItemOutcome::NoDocument => &self.no_document,
            ItemOutcome::ResolutionFailed { .. } => &self.resolution_failed,
            ItemOutcome::FetchFailed { .. } => &self.fetch_failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts a task that ended without reaching a terminal state (panic or cancellation).
    pub fn record_aborted(&self) {
        self.aborted.fetch_add(1, Ordering::SeqCst);
    }

    /// Items that reached any end state so far.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.summary().total()
    }

    /// Point-in-time copy of the counters.
    #[must_use]
    pub fn summary(&self) -> HarvestSummary {
        HarvestSummary {
            skipped: self.skipped.load(Ordering::SeqCst),
            downloaded: self.downloaded.load(Ordering::SeqCst),
            no_document: self.no_document.load(Ordering::SeqCst),
            resolution_failed: self.resolution_failed.load(Ordering::SeqCst),
            fetch_failed: self.fetch_failed.load(Ordering::SeqCst),
            aborted: self.aborted.load(Ordering::SeqCst),
        }
    }
}

/// Final counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub skipped: usize,
    pub downloaded: usize,
    pub no_document: usize,
    pub resolution_failed: usize,
    pub fetch_failed: usize,
    /// Tasks that panicked; recorded in the manifest as `error`.
    pub aborted: usize,
}

impl HarvestSummary {
    /// All items accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.skipped
            + self.downloaded
            + self.no_document
            + self.resolution_failed
            + self.fetch_failed
            + self.aborted
    }

    /// Items whose record is `error` or `download-error`.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.resolution_failed + self.fetch_failed + self.aborted
    }
}
