//! Durable `key -> ManifestRecord` map with atomic flush.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::error::ManifestError;
use super::record::{ManifestRecord, ManifestStatus};

/// Suffix of the backup written when a manifest cannot be parsed.
pub const CORRUPT_BACKUP_SUFFIX: &str = ".corrupt";

/// Suffix of the sibling temp file used by [`ManifestStore::flush`].
const TEMP_SUFFIX: &str = ".tmp";

/// In-memory manifest backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    project_root: PathBuf,
    records: BTreeMap<String, ManifestRecord>,
}

impl ManifestStore {
    /// Creates an empty store that will flush to `path`.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            project_root: project_root.into(),
            records: BTreeMap::new(),
        }
    }

    /// Loads the manifest at `path`.
    ///
    /// A missing file yields an empty store. An unparsable file also yields an
    /// empty store; its bytes are copied to `<path>.corrupt` first. Individual
    /// entries that do not parse as records are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] if the file exists but cannot be read.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(
        path: impl AsRef<Path>,
        project_root: impl Into<PathBuf>,
    ) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let mut store = Self::empty(path, project_root);

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("no manifest yet, starting empty");
                return Ok(store);
            }
            Err(error) => return Err(ManifestError::read(path, error)),
        };

        let raw: serde_json::Map<String, serde_json::Value> = match serde_json::from_slice(&bytes)
        {
            Ok(raw) => raw,
            Err(error) => {
                warn!(error = %error, "manifest is corrupt, starting fresh");
                backup_corrupt(path, &bytes).await;
                return Ok(store);
            }
        };

        for (key, value) in raw {
            match serde_json::from_value::<ManifestRecord>(value) {
                Ok(record) => {
                    store.records.insert(key, record);
                }
                Err(error) => warn!(key = %key, error = %error, "dropping unreadable manifest entry"),
            }
        }

        info!(records = store.records.len(), "manifest loaded");
        Ok(store)
    }

    /// Manifest file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root that relative `localPath` values are resolved against.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ManifestRecord> {
        self.records.get(key)
    }

    /// All records in key order.
    #[must_use]
    pub fn records(&self) -> &BTreeMap<String, ManifestRecord> {
        &self.records
    }

    /// True iff `key` has a `downloaded` record whose file currently exists.
    pub async fn should_skip(&self, key: &str) -> bool {
        match self.downloaded_path(key) {
            Some(path) => is_existing_file(&path).await,
            None => false,
        }
    }

    /// Absolute path of the file behind a `downloaded` record for `key`.
    fn downloaded_path(&self, key: &str) -> Option<PathBuf> {
        self.records
            .get(key)
            .filter(|record| record.status() == ManifestStatus::Downloaded)
            .and_then(ManifestRecord::local_path)
            .map(|local| self.resolve_local_path(local))
    }

    /// Replaces the record for `key`.
    pub fn upsert(&mut self, key: impl Into<String>, record: ManifestRecord) {
        self.records.insert(key.into(), record);
    }

    /// Resolves a stored `localPath` against the project root.
    #[must_use]
    pub fn resolve_local_path(&self, local: &Path) -> PathBuf {
        resolve_against(&self.project_root, local)
    }

    /// Converts a destination path into the form stored in `localPath`.
    #[must_use]
    pub fn relative_local_path(&self, path: &Path) -> PathBuf {
        relative_to(&self.project_root, path)
    }

    /// Writes the whole map to disk via a sibling temp file and rename.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if serialization, directory creation, the temp
    /// write, or the rename fails. The previous manifest is left intact on error.
    #[instrument(skip(self), fields(path = %self.path.display(), records = self.records.len()))]
    pub async fn flush(&self) -> Result<(), ManifestError> {
        let bytes = serde_json::to_vec_pretty(&self.records)
            .map_err(|source| ManifestError::Serialize { source })?;

        let temp_path = sibling_with_suffix(&self.path, TEMP_SUFFIX)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ManifestError::write(parent, e))?;
        }

        if let Err(error) = write_synced(&temp_path, &bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(ManifestError::write(&temp_path, error));
        }

        if let Err(error) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(ManifestError::write(&self.path, error));
        }

        debug!("manifest flushed");
        Ok(())
    }
}

/// Single-writer handle shared by concurrent workers.
///
/// Every mutation goes through [`SharedManifest::commit`], which performs the
/// upsert and the flush inside one critical section. Two flushes therefore
/// never interleave and no worker can overwrite another worker's update.
#[derive(Debug, Clone)]
pub struct SharedManifest {
    inner: Arc<Mutex<ManifestStore>>,
    project_root: Arc<PathBuf>,
}

impl SharedManifest {
    #[must_use]
    pub fn new(store: ManifestStore) -> Self {
        let project_root = Arc::new(store.project_root.clone());
        Self {
            inner: Arc::new(Mutex::new(store)),
            project_root,
        }
    }

    /// Project root of the wrapped store.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// See [`ManifestStore::should_skip`]. The file check runs after the lock is released.
    pub async fn should_skip(&self, key: &str) -> bool {
        let path = self.inner.lock().await.downloaded_path(key);
        match path {
            Some(path) => is_existing_file(&path).await,
            None => false,
        }
    }

    /// Returns a copy of the current record for `key`.
    pub async fn get(&self, key: &str) -> Option<ManifestRecord> {
        self.inner.lock().await.get(key).cloned()
    }

    /// Converts a destination path into the form stored in `localPath`.
    #[must_use]
    pub fn relative_local_path(&self, path: &Path) -> PathBuf {
        relative_to(&self.project_root, path)
    }

    /// Resolves a stored `localPath` against the project root.
    #[must_use]
    pub fn resolve_local_path(&self, local: &Path) -> PathBuf {
        resolve_against(&self.project_root, local)
    }

    /// Upserts `record` and flushes the manifest while holding the writer lock.
    ///
    /// # Errors
    ///
    /// Returns the flush error. The in-memory upsert is kept, so the next
    /// successful flush still persists it.
    pub async fn commit(
        &self,
        key: impl Into<String>,
        record: ManifestRecord,
    ) -> Result<(), ManifestError> {
        let mut store = self.inner.lock().await;
        store.upsert(key, record);
        store.flush().await
    }

    /// Flushes the current state.
    ///
    /// # Errors
    ///
    /// See [`ManifestStore::flush`].
    pub async fn flush(&self) -> Result<(), ManifestError> {
        self.inner.lock().await.flush().await
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

fn resolve_against(root: &Path, local: &Path) -> PathBuf {
    if local.is_absolute() {
        local.to_path_buf()
    } else {
        root.join(local)
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
}

async fn is_existing_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_file())
}

/// Writes `bytes` and waits for them to reach the disk before returning.
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> Result<PathBuf, ManifestError> {
    let file_name = path.file_name().ok_or_else(|| ManifestError::InvalidPath {
        path: path.to_path_buf(),
    })?;
    let mut name = OsString::from(file_name);
    name.push(suffix);
    Ok(path.with_file_name(name))
}

async fn backup_corrupt(path: &Path, bytes: &[u8]) {
    let Ok(backup) = sibling_with_suffix(path, CORRUPT_BACKUP_SUFFIX) else {
        return;
    };
    match tokio::fs::write(&backup, bytes).await {
        Ok(()) => info!(backup = %backup.display(), "saved corrupt manifest for inspection"),
        Err(error) => warn!(backup = %backup.display(), error = %error, "could not back up corrupt manifest"),
    }
}
