//! Centralized configuration for the asset metadata library.
//!
//! Fixed constants live in the `*Config` structs; everything the host wires
//! up at its composition root (registry endpoint, credentials, directories)
//! lives in the runtime settings structs below.

use crate::models::ResourceType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str =
        concat!("atelier-assets/", env!("CARGO_PKG_VERSION"));
    pub const DOWNLOAD_TEMP_SUFFIX: &'static str = ".part";
}

/// Directory and file name configuration.
pub struct PathsConfig;

impl PathsConfig {
    pub const METADATA_FILENAME: &'static str = "metadata.json";
    pub const CHECKPOINT_DIR_NAME: &'static str = "checkpoint";
    pub const LORA_DIR_NAME: &'static str = "lora";
    pub const VAE_DIR_NAME: &'static str = "vae";
    /// Extension of model binaries considered by synchronization.
    pub const MODEL_EXTENSION: &'static str = "safetensors";
}

/// Settings for the remote metadata registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Base URL of the registry service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional bearer credential attached to every outgoing request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://civitai.com".to_string()
}

fn default_timeout_secs() -> u64 {
    NetworkConfig::REQUEST_TIMEOUT.as_secs()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RegistrySettings {
    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Root of the durable metadata cache.
///
/// Layout below the root is fixed: one subtree per resource type, one
/// directory per asset stem, `metadata.json` plus sibling media inside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorePaths {
    pub root: PathBuf,
}

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding all entries of one resource type.
    pub fn bucket_dir(&self, kind: ResourceType) -> PathBuf {
        let name = match kind {
            ResourceType::Checkpoint => PathsConfig::CHECKPOINT_DIR_NAME,
            ResourceType::Lora => PathsConfig::LORA_DIR_NAME,
            ResourceType::Vae => PathsConfig::VAE_DIR_NAME,
        };
        self.root.join(name)
    }

    /// Directory for one asset, derived from the filename stem.
    pub fn entry_dir(&self, kind: ResourceType, stem: &str) -> PathBuf {
        self.bucket_dir(kind).join(stem)
    }
}

/// Directories of raw model binaries scanned by synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPaths {
    pub checkpoint_dir: PathBuf,
    pub lora_dir: PathBuf,
}

impl ScanPaths {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, lora_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            lora_dir: lora_dir.into(),
        }
    }

    /// Scan directories paired with the resource type their contents get.
    pub fn sources(&self) -> [(ResourceType, &Path); 2] {
        [
            (ResourceType::Checkpoint, self.checkpoint_dir.as_path()),
            (ResourceType::Lora, self.lora_dir.as_path()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_settings_defaults() {
        let settings = RegistrySettings::default();
        assert_eq!(settings.base_url, "https://civitai.com");
        assert!(settings.api_key.is_none());
        assert_eq!(settings.timeout(), NetworkConfig::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_registry_settings_deserialize_partial() {
        let settings: RegistrySettings =
            serde_json::from_str(r#"{"api_key": "secret"}"#).unwrap();
        assert_eq!(settings.base_url, "https://civitai.com");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_base_url_trimmed() {
        let settings = RegistrySettings {
            base_url: "https://civitai.com/".into(),
            ..Default::default()
        };
        assert_eq!(settings.base_url_trimmed(), "https://civitai.com");
    }

    #[test]
    fn test_store_paths_layout() {
        let paths = StorePaths::new("/data/meta");
        assert_eq!(
            paths.entry_dir(ResourceType::Lora, "detail-tweaker"),
            PathBuf::from("/data/meta/lora/detail-tweaker")
        );
    }
}
