//! Bounded LRU cache of preview media.
//!
//! Purely a read-speed optimization over the media files in the local
//! store; it can be cleared at any time without data loss. Eviction is
//! strict least-recently-used: every successful access refreshes an
//! entry's recency, and inserting past capacity evicts exactly the one
//! entry touched longest ago. The cache is not synchronized; the owning
//! component serializes access.

use crate::error::{AssetError, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default number of media blobs kept in memory.
pub const DEFAULT_CAPACITY: usize = 100;

/// In-process LRU cache of decoded media blobs keyed by path.
#[derive(Debug)]
pub struct MediaCache {
    capacity: usize,
    /// Entry payloads with the tick of their last access.
    entries: HashMap<PathBuf, (u64, Bytes)>,
    /// Monotonic access counter backing the recency order.
    tick: u64,
}

impl MediaCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            tick: 0,
        }
    }

    /// Get a cached blob without touching the filesystem.
    ///
    /// A hit marks the entry most-recently-used.
    pub fn get(&mut self, path: &Path) -> Option<Bytes> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(path).map(|entry| {
            entry.0 = tick;
            entry.1.clone()
        })
    }

    /// Get a blob, loading it from disk and caching it on a miss.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Bytes> {
        if let Some(blob) = self.get(path) {
            return Ok(blob);
        }

        let blob = Bytes::from(
            std::fs::read(path).map_err(|e| AssetError::io_with_path(e, path))?,
        );
        self.insert(path.to_path_buf(), blob.clone());
        Ok(blob)
    }

    fn insert(&mut self, path: PathBuf, blob: Bytes) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&path) {
            self.evict_lru();
        }
        self.tick += 1;
        self.entries.insert(path, (self.tick, blob));
    }

    /// Remove the single least-recently-used entry.
    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (tick, _))| *tick)
            .map(|(path, _)| path.clone());
        if let Some(path) = oldest {
            debug!("Evicting cached media {}", path.display());
            self.entries.remove(&path);
        }
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a path is currently cached. Does not refresh recency.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }
}

impl Default for MediaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn media_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_get_on_empty_cache_is_none() {
        let mut cache = MediaCache::new(2);
        assert!(cache.get(Path::new("/nope.png")).is_none());
    }

    #[test]
    fn test_get_or_load_caches() {
        let dir = TempDir::new().unwrap();
        let a = media_file(&dir, "a.png", b"aaa");

        let mut cache = MediaCache::new(2);
        assert_eq!(cache.get_or_load(&a).unwrap(), Bytes::from_static(b"aaa"));
        assert!(cache.contains(&a));
        assert_eq!(cache.get(&a).unwrap(), Bytes::from_static(b"aaa"));
    }

    #[test]
    fn test_get_or_load_missing_file_errors() {
        let mut cache = MediaCache::new(2);
        assert!(cache.get_or_load(Path::new("/missing/a.png")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_access_refreshes_recency() {
        let dir = TempDir::new().unwrap();
        let a = media_file(&dir, "a.png", b"a");
        let b = media_file(&dir, "b.png", b"b");
        let c = media_file(&dir, "c.png", b"c");

        let mut cache = MediaCache::new(2);
        cache.get_or_load(&a).unwrap();
        cache.get_or_load(&b).unwrap();
        // Touch A so B becomes least-recently-used.
        cache.get(&a).unwrap();
        cache.get_or_load(&c).unwrap();

        assert!(cache.contains(&a), "A was refreshed and must survive");
        assert!(!cache.contains(&b), "B was LRU and must be evicted");
        assert!(cache.contains(&c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_insertion_order_eviction_without_access() {
        let dir = TempDir::new().unwrap();
        let a = media_file(&dir, "a.png", b"a");
        let b = media_file(&dir, "b.png", b"b");
        let c = media_file(&dir, "c.png", b"c");

        let mut cache = MediaCache::new(2);
        cache.get_or_load(&a).unwrap();
        cache.get_or_load(&b).unwrap();
        cache.get_or_load(&c).unwrap();

        assert!(!cache.contains(&a));
        assert!(cache.contains(&b));
        assert!(cache.contains(&c));
    }

    #[test]
    fn test_reloading_existing_entry_does_not_evict() {
        let dir = TempDir::new().unwrap();
        let a = media_file(&dir, "a.png", b"a");
        let b = media_file(&dir, "b.png", b"b");

        let mut cache = MediaCache::new(2);
        cache.get_or_load(&a).unwrap();
        cache.get_or_load(&b).unwrap();
        cache.get_or_load(&a).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&b));
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let a = media_file(&dir, "a.png", b"a");

        let mut cache = MediaCache::new(2);
        cache.get_or_load(&a).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        // Cleared entries reload transparently.
        assert!(cache.get_or_load(&a).is_ok());
    }
}
