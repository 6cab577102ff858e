//! Filesystem-backed store of canonical metadata snapshots.
//!
//! One directory per asset under `<root>/<bucket>/<stem>/`, holding
//! `metadata.json` plus the localized example media. All lookups are served
//! from an in-memory index rebuilt by [`LocalStore::flush`]; disk is the
//! authority and memory is a cache of it.
//!
//! The index is mutated only by `flush`, `save` and `delete`. The host is
//! expected to serialize mutating calls from a single logical owner; the
//! internal lock only keeps concurrent readers safe and is never held
//! across an await point.

mod atomic;
mod localize;

pub(crate) use atomic::{atomic_read_json, atomic_write_json};

use crate::config::{NetworkConfig, PathsConfig, StorePaths};
use crate::error::{AssetError, Result};
use crate::models::{meta::stem_of, ModelMeta, ResourceType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// In-memory index: one bucket per resource type.
#[derive(Debug, Default)]
struct Buckets {
    checkpoints: Vec<ModelMeta>,
    loras: Vec<ModelMeta>,
    vaes: Vec<ModelMeta>,
}

impl Buckets {
    fn bucket_mut(&mut self, kind: ResourceType) -> &mut Vec<ModelMeta> {
        match kind {
            ResourceType::Checkpoint => &mut self.checkpoints,
            ResourceType::Lora => &mut self.loras,
            ResourceType::Vae => &mut self.vaes,
        }
    }

    fn iter_all(&self) -> impl Iterator<Item = &ModelMeta> {
        self.checkpoints
            .iter()
            .chain(self.loras.iter())
            .chain(self.vaes.iter())
    }

    fn len(&self) -> usize {
        self.checkpoints.len() + self.loras.len() + self.vaes.len()
    }
}

/// Buckets with an on-disk subtree walked by `flush`.
///
/// The vae bucket exists in memory (entries can be saved and queried) but
/// has no scanned subtree yet.
const FLUSHED_BUCKETS: [ResourceType; 2] = [ResourceType::Checkpoint, ResourceType::Lora];

/// Local metadata store.
///
/// Construct one at the host's composition root and pass it by handle to
/// every consumer.
pub struct LocalStore {
    paths: StorePaths,
    /// Client for fetching example media during localization. Preview media
    /// is served from a public CDN, so no credential is attached.
    http: reqwest::Client,
    buckets: RwLock<Buckets>,
}

impl LocalStore {
    /// Open a store rooted at `paths.root`, creating the root if needed and
    /// loading the index from disk.
    pub fn open(paths: StorePaths) -> Result<Self> {
        std::fs::create_dir_all(&paths.root)
            .map_err(|e| AssetError::io_with_path(e, &paths.root))?;

        let http = reqwest::Client::builder()
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| AssetError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        let store = Self {
            paths,
            http,
            buckets: RwLock::new(Buckets::default()),
        };

        if let Err(e) = store.flush() {
            warn!("Failed to load metadata index on startup: {}", e);
        }

        Ok(store)
    }

    /// Root paths this store persists under.
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    // ========================================
    // Index lifecycle
    // ========================================

    /// Clear the in-memory index and reload it from disk.
    ///
    /// Walks the fixed `<bucket>/<stem>/metadata.json` layout. A directory
    /// without a snapshot, or with one that fails to parse, is skipped with
    /// a warning. Idempotent: two flushes with no intervening filesystem
    /// change produce the same index.
    pub fn flush(&self) -> Result<()> {
        let mut fresh = Buckets::default();

        for kind in FLUSHED_BUCKETS {
            let dir = self.paths.bucket_dir(kind);
            if !dir.is_dir() {
                debug!("Bucket directory does not exist: {}", dir.display());
                continue;
            }

            let entries =
                std::fs::read_dir(&dir).map_err(|e| AssetError::io_with_path(e, &dir))?;
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                        continue;
                    }
                };
                let entry_path = entry.path();
                if !entry_path.is_dir() {
                    continue;
                }

                let snapshot = entry_path.join(PathsConfig::METADATA_FILENAME);
                match atomic_read_json::<ModelMeta>(&snapshot) {
                    Ok(Some(meta)) => {
                        debug!("Loaded {} entry: {}", kind, meta.name);
                        fresh.bucket_mut(kind).push(meta);
                    }
                    Ok(None) => {
                        warn!("Metadata file missing: {}", snapshot.display());
                    }
                    Err(e) => {
                        warn!("Failed to load snapshot {}: {}", snapshot.display(), e);
                    }
                }
            }
        }

        let total = fresh.len();
        *self.buckets.write().unwrap() = fresh;
        info!("Metadata index loaded with {} entries", total);
        Ok(())
    }

    /// Localize and persist a metadata snapshot, then update the index.
    ///
    /// Delegates the disk work to the localization pipeline (the sole
    /// writer of `metadata.json`) and upserts the resulting entry into its
    /// bucket. Returns the snapshot as written.
    pub async fn save(&self, meta: ModelMeta) -> Result<ModelMeta> {
        let localized = localize::localize_and_save(&self.http, &self.paths, meta).await?;

        let mut buckets = self.buckets.write().unwrap();
        let bucket = buckets.bucket_mut(localized.kind);
        let stem = localized.stem();
        match bucket.iter().position(|m| m.stem() == stem) {
            Some(pos) => bucket[pos] = localized.clone(),
            None => bucket.push(localized.clone()),
        }
        drop(buckets);

        Ok(localized)
    }

    /// Delete every entry on disk and clear the index.
    ///
    /// Returns the number of entry directories removed. Directories that
    /// fail to delete are logged and left in place; the next `flush` picks
    /// their entries back up.
    pub fn clear_all(&self) -> usize {
        let mut deleted = 0usize;

        for kind in FLUSHED_BUCKETS {
            let dir = self.paths.bucket_dir(kind);
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let entry_path = entry.path();
                if !entry_path.is_dir() {
                    continue;
                }
                match std::fs::remove_dir_all(&entry_path) {
                    Ok(()) => {
                        debug!("Deleted metadata directory {}", entry_path.display());
                        deleted += 1;
                    }
                    Err(e) => {
                        warn!("Failed to delete {}: {}", entry_path.display(), e);
                    }
                }
            }
        }

        *self.buckets.write().unwrap() = Buckets::default();
        info!("Cleared metadata store, deleted {} entries", deleted);
        deleted
    }

    /// Delete an entry: remove its directory recursively, then drop it from
    /// the index. Returns false if the directory removal failed.
    pub fn delete(&self, meta: &ModelMeta) -> bool {
        let dir = self.paths.entry_dir(meta.kind, &meta.stem());
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("Failed to delete {}: {}", dir.display(), e);
                return false;
            }
            info!("Deleted metadata directory {}", dir.display());
        } else {
            warn!("Metadata directory does not exist: {}", dir.display());
        }

        let mut buckets = self.buckets.write().unwrap();
        let bucket = buckets.bucket_mut(meta.kind);
        let stem = meta.stem();
        match bucket.iter().position(|m| m.stem() == stem) {
            Some(pos) => {
                bucket.remove(pos);
            }
            None => debug!("Entry was not in the index: {}", stem),
        }

        true
    }

    // ========================================
    // Lookups (in-memory only)
    // ========================================

    /// Look up an entry by model name or filename (extension ignored).
    pub fn get_by_name(&self, name: &str) -> Option<ModelMeta> {
        let stem = stem_of(name);
        self.buckets
            .read()
            .unwrap()
            .iter_all()
            .find(|m| m.stem() == stem || m.name == name)
            .cloned()
    }

    /// Look up an entry by the path of its model binary.
    pub fn get_by_path(&self, path: &Path) -> Option<ModelMeta> {
        if !path.exists() {
            warn!("Model file does not exist: {}", path.display());
            return None;
        }
        let stem = path.file_stem()?.to_string_lossy();
        self.get_by_name(&stem)
    }

    /// Look up an entry by content hash (case-insensitive).
    pub fn get_by_hash(&self, hash: &str) -> Option<ModelMeta> {
        self.buckets
            .read()
            .unwrap()
            .iter_all()
            .find(|m| m.matches_hash(hash))
            .cloned()
    }

    /// Look up an entry by registry version id.
    pub fn get_by_version_id(&self, version_id: u64) -> Option<ModelMeta> {
        self.buckets
            .read()
            .unwrap()
            .iter_all()
            .find(|m| m.version_id == version_id)
            .cloned()
    }

    /// Snapshot of every indexed entry.
    pub fn all(&self) -> Vec<ModelMeta> {
        self.buckets.read().unwrap().iter_all().cloned().collect()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.buckets.read().unwrap().len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
