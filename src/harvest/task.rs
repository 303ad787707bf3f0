//! Per-item state machine: skip check, resolve, fetch, record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::{HarvestStats, ItemOutcome};
use crate::discovery::{Item, PageRenderer};
use crate::download::{FetchExecutor, verify_file};
use crate::error_log::ErrorLog;
use crate::manifest::{ManifestRecord, SharedManifest};

/// Everything a worker needs, shared across tasks.
pub(super) struct TaskContext {
    pub renderer: Arc<dyn PageRenderer>,
    pub executor: FetchExecutor,
    pub manifest: SharedManifest,
    pub error_log: ErrorLog,
    pub stats: Arc<HarvestStats>,
    pub verify_on_skip: bool,
}

/// Runs one item to a terminal state and counts it.
///
/// Every failure is converted into a manifest record here; nothing propagates.
pub(super) async fn process_item(
    ctx: Arc<TaskContext>,
    item: Item,
    destination: PathBuf,
) -> ItemOutcome {
    let outcome = run_item(&ctx, &item, &destination).await;
    ctx.stats.record(&outcome);
    outcome
}

async fn run_item(ctx: &TaskContext, item: &Item, destination: &Path) -> ItemOutcome {
    if ctx.manifest.should_skip(&item.key).await {
        if !ctx.verify_on_skip || stored_download_verifies(ctx, &item.key).await {
            info!(key = %item.key, title = %item.title, "skip: already downloaded");
            return ItemOutcome::Skipped;
        }
        warn!(
            key = %item.key,
            "stored file no longer matches its manifest record; fetching again"
        );
    }

    let document_url = match ctx.renderer.resolve_document_url(&item.source_page_url).await {
        Ok(Some(url)) => url,
        Ok(None) => {
            info!(key = %item.key, title = %item.title, "no document link found");
            commit(ctx, item, ManifestRecord::no_document(item)).await;
            return ItemOutcome::NoDocument;
        }
        Err(error) => {
            let message = error.to_string();
            warn!(key = %item.key, error = %message, "resolution failed");
            ctx.error_log
                .append(&format!(
                    "Resolution failed for \"{}\" [{}]: {message}",
                    item.title, item.key
                ))
                .await;
            commit(ctx, item, ManifestRecord::failed(item, None, message.clone())).await;
            return ItemOutcome::ResolutionFailed { message };
        }
    };

    match ctx.executor.fetch(&document_url, destination).await {
        Ok(download) => {
            let local_path = ctx.manifest.relative_local_path(&download.path);
            let record = ManifestRecord::downloaded(item, &document_url, local_path, &download);
            commit(ctx, item, record).await;
            info!(
                key = %item.key,
                path = %download.path.display(),
                size_bytes = download.size_bytes,
                "downloaded"
            );
            ItemOutcome::Downloaded {
                path: download.path,
                size_bytes: download.size_bytes,
            }
        }
        Err(error) => {
            let message = error.to_string();
            warn!(key = %item.key, url = %document_url, error = %message, "download failed");
            ctx.error_log
                .append(&format!(
                    "Download failed for \"{}\" [{}] from {document_url}: {message}",
                    item.title, item.key
                ))
                .await;
            commit(
                ctx,
                item,
                ManifestRecord::download_error(item, &document_url, message.clone()),
            )
            .await;
            ItemOutcome::FetchFailed { message }
        }
    }
}

/// Re-hashes the stored file for `key` against its record.
async fn stored_download_verifies(ctx: &TaskContext, key: &str) -> bool {
    let Some(record) = ctx.manifest.get(key).await else {
        return false;
    };
    let Some((local, size_bytes, digest_hex)) = record.download_evidence() else {
        return false;
    };
    let path = ctx.manifest.resolve_local_path(local);
    verify_file(&path)
        .await
        .is_ok_and(|digest| digest.matches(size_bytes, digest_hex))
}

/// Commits a record; a failed flush is reported and the run continues.
pub(super) async fn commit(ctx: &TaskContext, item: &Item, record: ManifestRecord) {
    if let Err(error) = ctx.manifest.commit(item.key.clone(), record).await {
        warn!(key = %item.key, error = %error, "manifest update failed");
        ctx.error_log
            .append(&format!("Manifest update failed for [{}]: {error}", item.key))
            .await;
    }
}
