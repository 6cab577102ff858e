//! Synchronization orchestrator.
//!
//! Scans the configured model directories and backfills metadata for every
//! binary the local store doesn't know yet: hash the file, resolve the hash
//! against the provider, localize and persist the result. Files are
//! processed strictly sequentially; concurrency happens only inside one
//! file's save, where that model's media fetches run together.
//!
//! A run always completes. Any failure while processing one file is caught,
//! logged with file and stage context, counted, and the scan moves on.

use crate::config::{PathsConfig, ScanPaths};
use crate::error::Result;
use crate::hashing::sha256_file_async;
use crate::models::meta::stem_of;
use crate::provider::MetaProvider;
use crate::store::LocalStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome counters of one synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Entries resolved and persisted.
    pub success: usize,
    /// Files whose processing failed or found no registry entry.
    pub failed: usize,
    /// Files skipped because an entry with the same stem already exists.
    pub skipped: usize,
}

/// What happened to a single scanned file.
enum FileOutcome {
    Synced,
    NotFound,
}

/// Orchestrates directory scans against a metadata provider.
pub struct Synchronizer {
    store: Arc<LocalStore>,
    provider: Arc<dyn MetaProvider>,
    scan: ScanPaths,
}

impl Synchronizer {
    pub fn new(store: Arc<LocalStore>, provider: Arc<dyn MetaProvider>, scan: ScanPaths) -> Self {
        Self {
            store,
            provider,
            scan,
        }
    }

    /// Scan the checkpoint and lora source directories and backfill
    /// missing metadata entries.
    ///
    /// A file whose stem is already indexed is skipped without hashing, so
    /// a binary replaced in place under the same name is never re-resolved;
    /// filenames are trusted as stable identity. Delete the stale entry
    /// first to force re-resolution.
    pub async fn sync_from_source(&self) -> SyncReport {
        info!("Starting metadata synchronization");
        let mut report = SyncReport::default();

        for (kind, dir) in self.scan.sources() {
            if !dir.is_dir() {
                warn!("Scan directory does not exist: {}", dir.display());
                continue;
            }
            debug!("Scanning {} directory: {}", kind, dir.display());

            for file in list_model_files(dir) {
                self.sync_one(&file, &mut report).await;
            }
        }

        info!(
            "Synchronization finished: {} succeeded, {} failed, {} skipped",
            report.success, report.failed, report.skipped
        );
        report
    }

    async fn sync_one(&self, file: &Path, report: &mut SyncReport) {
        let file_display = file.display();

        let stem = stem_of(&file.to_string_lossy());
        if self.store.get_by_name(&stem).is_some() {
            debug!("Skipping {} (already indexed)", file_display);
            report.skipped += 1;
            return;
        }

        match self.try_sync(file).await {
            Ok(FileOutcome::Synced) => {
                info!("Synchronized {}", file_display);
                report.success += 1;
            }
            Ok(FileOutcome::NotFound) => {
                warn!("No registry entry for {}", file_display);
                report.failed += 1;
            }
            Err(e) => {
                warn!("Failed to synchronize {}: {}", file_display, e);
                report.failed += 1;
            }
        }
    }

    async fn try_sync(&self, file: &Path) -> Result<FileOutcome> {
        debug!("Hashing {}", file.display());
        let hash = sha256_file_async(file).await?;

        debug!("Resolving hash {} for {}", hash, file.display());
        let Some(meta) = self.provider.resolve_by_hash(&hash).await? else {
            return Ok(FileOutcome::NotFound);
        };

        debug!("Saving metadata for {}", file.display());
        self.provider.save(meta).await?;
        Ok(FileOutcome::Synced)
    }
}

/// Model binaries directly under `dir`, sorted for a deterministic scan
/// order.
fn list_model_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read scan directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map_or(false, |ext| ext == PathsConfig::MODEL_EXTENSION)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_model_files_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.safetensors"), b"b").unwrap();
        std::fs::write(temp.path().join("a.safetensors"), b"a").unwrap();
        std::fs::write(temp.path().join("readme.txt"), b"x").unwrap();
        std::fs::create_dir(temp.path().join("nested.safetensors")).unwrap();

        let files = list_model_files(temp.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.safetensors", "b.safetensors"]);
    }

    #[test]
    fn test_list_model_files_missing_dir_is_empty() {
        assert!(list_model_files(Path::new("/nonexistent/scan/dir")).is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let report = SyncReport {
            success: 2,
            failed: 1,
            skipped: 0,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"success":2,"failed":1,"skipped":0}"#);
    }
}
