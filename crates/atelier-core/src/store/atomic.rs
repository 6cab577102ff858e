//! Atomic JSON persistence for metadata snapshots.
//!
//! Writes go to a temp file with a unique PID+TID suffix, get flushed and
//! synced, then renamed over the target so readers never observe a
//! half-written snapshot.

use crate::error::{AssetError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::process;
use std::thread;
use tracing::debug;

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = File::open(path).map_err(|e| AssetError::io_with_path(e, path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| AssetError::io_with_path(e, path))?;

    let data: T = serde_json::from_str(&contents).map_err(|e| AssetError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically, pretty-printed.
///
/// Creates parent directories as needed. The temp file is cleaned up if
/// the rename fails.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| AssetError::io_with_path(e, parent))?;
        }
    }

    let temp_path = path.with_extension(format!("json.{}.{}.tmp", process::id(), thread_id()));

    let serialized = serde_json::to_string_pretty(data).map_err(|e| AssetError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| AssetError::io_with_path(e, &temp_path))?;

        file.write_all(serialized.as_bytes())
            .map_err(|e| AssetError::io_with_path(e, &temp_path))?;
        file.flush()
            .map_err(|e| AssetError::io_with_path(e, &temp_path))?;
        file.sync_all()
            .map_err(|e| AssetError::io_with_path(e, &temp_path))?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        AssetError::io_with_path(e, path)
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Get a unique numeric identifier for the current thread.
fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    format!("{:?}", thread::current().id()).hash(&mut hasher);
    hasher.finish()
}
