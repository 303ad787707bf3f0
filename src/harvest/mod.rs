//! Task coordinator: bounded-concurrency processing of discovered items.
//!
//! Each item runs `skip check → resolve → fetch → verify → record` in its own
//! Tokio task. Outcomes are written back through a [`SharedManifest`], the
//! single writer of the manifest file.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use harvester_core::discovery::{DiscoveryOptions, HttpPageRenderer, RendererSettings, discover_items};
//! use harvester_core::download::{FetchExecutor, HttpClient};
//! use harvester_core::error_log::ErrorLog;
//! use harvester_core::harvest::{HarvestConfig, Harvester};
//! use harvester_core::manifest::{ManifestStore, SharedManifest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = Arc::new(HttpPageRenderer::new(&RendererSettings::default())?);
//! let items = discover_items(renderer.as_ref(), "https://example.gov.pk/civil", &DiscoveryOptions::default()).await?;
//!
//! let manifest = SharedManifest::new(ManifestStore::load("manifest.json", ".").await?);
//! let harvester = Harvester::new(
//!     HarvestConfig::new("pdfs"),
//!     renderer,
//!     FetchExecutor::new(Arc::new(HttpClient::new())),
//!     manifest,
//!     ErrorLog::new("errors.log"),
//! )?;
//! let summary = harvester.run(items).await?;
//! println!("downloaded {}, failed {}", summary.downloaded, summary.failed());
//! # Ok(())
//! # }
//! ```

mod error;
mod outcome;
mod stats;
mod task;

pub use error::HarvestError;
pub use outcome::ItemOutcome;
pub use stats::{HarvestStats, HarvestSummary};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::discovery::{Item, PageRenderer};
use crate::download::{FetchExecutor, document_file_name};
use crate::error_log::ErrorLog;
use crate::manifest::{ManifestRecord, SharedManifest};
use task::{TaskContext, commit, process_item};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default worker pool width.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Coordinator settings.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Flat directory receiving `<title>.pdf` files.
    pub output_dir: PathBuf,
    /// Worker pool width (1-100).
    pub concurrency: usize,
    /// Append `-<sha256(key)[..8]>` to file stems.
    pub disambiguate_names: bool,
    /// Re-hash stored files before skipping them.
    pub verify_on_skip: bool,
}

impl HarvestConfig {
    /// Settings with default concurrency and naming.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            disambiguate_names: false,
            verify_on_skip: false,
        }
    }
}

/// Runs items through a semaphore-bounded worker pool.
///
/// # Concurrency Model
///
/// - Each item runs in its own Tokio task
/// - A semaphore permit is acquired before spawning each task
/// - Permits are released when tasks complete (RAII)
/// - Manifest writes are serialized by [`SharedManifest::commit`]
pub struct Harvester {
    config: HarvestConfig,
    semaphore: Arc<Semaphore>,
    context: Arc<TaskContext>,
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Creates a harvester.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidConcurrency`] if the value is outside 1-100.
    pub fn new(
        config: HarvestConfig,
        renderer: Arc<dyn PageRenderer>,
        executor: FetchExecutor,
        manifest: SharedManifest,
        error_log: ErrorLog,
    ) -> Result<Self, HarvestError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.concurrency) {
            return Err(HarvestError::InvalidConcurrency {
                value: config.concurrency,
            });
        }

        debug!(
            concurrency = config.concurrency,
            output_dir = %config.output_dir.display(),
            disambiguate_names = config.disambiguate_names,
            verify_on_skip = config.verify_on_skip,
            "creating harvester"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.concurrency)),
            context: Arc::new(TaskContext {
                renderer,
                executor,
                manifest,
                error_log,
                stats: Arc::new(HarvestStats::new()),
                verify_on_skip: config.verify_on_skip,
            }),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Live counters, readable while [`Harvester::run`] is in progress.
    #[must_use]
    pub fn stats(&self) -> Arc<HarvestStats> {
        Arc::clone(&self.context.stats)
    }

    /// Destination path of an item.
    #[must_use]
    pub fn destination_for(&self, item: &Item) -> PathBuf {
        self.config.output_dir.join(document_file_name(
            &item.title,
            &item.key,
            self.config.disambiguate_names,
        ))
    }

    /// Processes every item and flushes the manifest.
    ///
    /// Per-item failures are recorded in the manifest and the error log and
    /// counted in the summary; they never make this method fail.
    ///
    /// # Errors
    ///
    /// - [`HarvestError::SemaphoreClosed`] if the worker pool shuts down
    /// - [`HarvestError::FinalFlush`] if the manifest cannot be written at the end
    #[instrument(skip(self, items), fields(items = items.len(), concurrency = self.config.concurrency))]
    pub async fn run(&self, items: Vec<Item>) -> Result<HarvestSummary, HarvestError> {
        self.report_name_collisions(&items);

        info!("starting harvest");

        let mut handles = Vec::with_capacity(items.len());
        for item in items {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| HarvestError::SemaphoreClosed)?;

            let destination = self.destination_for(&item);
            let ctx = Arc::clone(&self.context);
            let task_item = item.clone();

            handles.push((
                item,
                tokio::spawn(async move {
                    let _permit = permit;
                    process_item(ctx, task_item, destination).await
                }),
            ));
        }

        debug!(task_count = handles.len(), "waiting for items to finish");

        for (item, handle) in handles {
            if let Err(error) = handle.await {
                self.record_aborted_task(&item, &error).await;
            }
        }

        self.context
            .manifest
            .flush()
            .await
            .map_err(HarvestError::FinalFlush)?;

        let summary = self.context.stats.summary();
        info!(
            skipped = summary.skipped,
            downloaded = summary.downloaded,
            no_document = summary.no_document,
            resolution_failed = summary.resolution_failed,
            fetch_failed = summary.fetch_failed,
            aborted = summary.aborted,
            "harvest complete"
        );
        Ok(summary)
    }

    async fn record_aborted_task(&self, item: &Item, error: &tokio::task::JoinError) {
        let message = if error.is_panic() {
            "item task panicked".to_string()
        } else {
            format!("item task did not complete: {error}")
        };
        warn!(key = %item.key, error = %message, "item task aborted");
        self.context
            .error_log
            .append(&format!(
                "Task aborted for \"{}\" [{}]: {message}",
                item.title, item.key
            ))
            .await;
        commit(&self.context, item, ManifestRecord::failed(item, None, message)).await;
        self.context.stats.record_aborted();
    }

    fn report_name_collisions(&self, items: &[Item]) {
        let mut owners: HashMap<PathBuf, &str> = HashMap::new();
        for item in items {
            let destination = self.destination_for(item);
            if let Some(first) = owners.get(&destination) {
                warn!(
                    path = %destination.display(),
                    first_key = %first,
                    second_key = %item.key,
                    "two items map to the same file; enable disambiguate_names to keep both"
                );
            } else {
                owners.insert(destination, &item.key);
            }
        }
    }
}
