//! Error types for the asset metadata library.
//!
//! "Not found" is never an error in this crate: registry and store lookups
//! return `Ok(None)` for a missing entry. Errors are reserved for transport
//! failures, filesystem failures, and contract violations (a success response
//! whose payload does not have the expected shape).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for asset metadata operations.
#[derive(Debug, Error)]
pub enum AssetError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    // Registry contract errors
    #[error("Malformed registry response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Identifier errors
    #[error("Invalid asset identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for asset metadata operations.
pub type Result<T> = std::result::Result<T, AssetError>;

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        AssetError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(err: serde_json::Error) -> Self {
        AssetError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for AssetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AssetError::Timeout(Duration::from_secs(0))
        } else {
            AssetError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl AssetError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        AssetError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Check if this error is a transient transport failure.
    ///
    /// Contract violations (malformed payloads, invalid identifiers) are
    /// never transient: retrying the same request cannot fix them.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AssetError::Network { .. }
                | AssetError::Timeout(_)
                | AssetError::DownloadFailed { .. }
                | AssetError::Io { .. }
        )
    }
}
