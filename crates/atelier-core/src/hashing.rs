//! Streaming content digest for model binaries.
//!
//! Model files commonly span gigabytes, so hashing reads fixed-size chunks
//! and keeps memory use constant regardless of file size. I/O errors
//! propagate with path context; there is no retry here.

use crate::error::{AssetError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files while hashing.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 of a file as a lowercase hex string.
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|e| AssetError::io_with_path(e, path))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| AssetError::io_with_path(e, path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 of a file on the blocking worker pool.
///
/// Hashing is CPU/IO bound and can take seconds on large checkpoints, so
/// async callers offload it instead of stalling the scheduler.
pub async fn sha256_file_async(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || sha256_file(&path))
        .await
        .map_err(|e| AssetError::Other(format!("Hash task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let hash = sha256_file(file.path()).unwrap();
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"model weights").unwrap();
        file.flush().unwrap();

        let hash = sha256_file(file.path()).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_identical_content_identical_hash() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.safetensors");
        let b = dir.path().join("subdir").join("b.safetensors");
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, vec![42u8; 200_000]).unwrap();
        std::fs::write(&b, vec![42u8; 200_000]).unwrap();

        assert_eq!(sha256_file(&a).unwrap(), sha256_file(&b).unwrap());
    }

    #[test]
    fn test_missing_file_propagates_error() {
        let err = sha256_file("/nonexistent/model.safetensors").unwrap_err();
        match err {
            AssetError::Io { path, .. } => {
                assert!(path.unwrap().ends_with("model.safetensors"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![7u8; CHUNK_SIZE * 3 + 17]).unwrap();
        file.flush().unwrap();

        let sync_hash = sha256_file(file.path()).unwrap();
        let async_hash = sha256_file_async(file.path()).await.unwrap();
        assert_eq!(sync_hash, async_hash);
    }
}
