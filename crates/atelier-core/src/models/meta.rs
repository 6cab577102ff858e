//! Canonical asset metadata types.
//!
//! A [`ModelMeta`] is created transiently by the registry resolver (example
//! media still pointing at remote URLs) or loaded durably from the local
//! store (media pointing at `file://` copies). The localization pipeline is
//! the only place a transient instance becomes durable.

use crate::models::identifier::{AssetId, Ecosystem, ResourceType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Generation parameters recorded with an example image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationArgs {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    #[serde(default = "default_sampler")]
    pub sampler: String,
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_skip: Option<u32>,
}

fn default_steps() -> u32 {
    20
}

fn default_cfg_scale() -> f64 {
    7.0
}

fn default_sampler() -> String {
    "Euler a".to_string()
}

fn default_seed() -> i64 {
    -1
}

fn default_dimension() -> u32 {
    512
}

impl Default for GenerationArgs {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt: String::new(),
            negative_prompt: String::new(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            sampler: default_sampler(),
            seed: default_seed(),
            width: default_dimension(),
            height: default_dimension(),
            clip_skip: None,
        }
    }
}

/// One example image reference plus the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Remote URL before localization, `file://` URL after, or absent.
    #[serde(default)]
    pub url: Option<String>,
    pub args: GenerationArgs,
}

impl Example {
    /// File name of the example media, derived from the URL's last path
    /// segment. `None` when there is no URL to derive from.
    pub fn filename(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        last_path_segment(url)
    }

    /// Whether this example references media that is already local
    /// (`file://` URL or plain path) rather than a remote resource.
    pub fn is_local(&self) -> bool {
        self.url.as_deref().map_or(true, is_local_url)
    }

    /// Resolve a localized example to the on-disk media path.
    ///
    /// Returns `None` for remote examples and examples without media.
    pub fn local_path(&self) -> Option<PathBuf> {
        local_path(self.url.as_deref()?)
    }
}

/// Extract the last path segment of a URL, ignoring query and fragment.
fn last_path_segment(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Not an absolute URL; treat the whole string as a path.
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let segment = path.rsplit('/').next()?.trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Whether a URL points at local storage (`file://` scheme or no scheme).
pub fn is_local_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.scheme() == "file",
        // Relative strings have no scheme and are treated as local paths.
        Err(_) => true,
    }
}

/// Convert a local URL (or plain path string) to a filesystem path.
pub fn local_path(url: &str) -> Option<PathBuf> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok(),
        Ok(_) => None,
        Err(_) => Some(PathBuf::from(url)),
    }
}

/// Filename stem: the last path component with its extension removed.
pub(crate) fn stem_of(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// Canonical metadata snapshot for one model asset.
///
/// Serialized as pretty-printed JSON in each asset's `metadata.json`.
/// The on-disk fields are stable and additive-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Name of the model binary this entry describes (with extension).
    pub filename: String,
    /// Display name of the model on the registry.
    pub name: String,
    /// Label of this specific version.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Registry model id.
    pub model_id: u64,
    /// Registry version id. Versions are the downloadable unit, so this is
    /// the id lookups key on.
    pub version_id: u64,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub ecosystem: Ecosystem,
    /// Concrete base model this asset was trained against (e.g. "Pony"),
    /// distinct from the ecosystem generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_model: Option<String>,
    /// Lowercase hex SHA-256 of the model binary.
    pub sha256: String,
    #[serde(default)]
    pub trained_words: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_page_url: Option<String>,
    #[serde(default)]
    pub examples: Vec<Example>,
}

impl ModelMeta {
    /// Display name combined with the version label.
    pub fn version_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Filename stem, the sole on-disk key for this entry.
    pub fn stem(&self) -> String {
        stem_of(&self.filename)
    }

    /// Canonical asset identifier derived from the identity fields.
    pub fn identifier(&self) -> AssetId {
        AssetId {
            ecosystem: self.ecosystem,
            resource_type: self.kind,
            model_id: self.model_id,
            version_id: self.version_id,
        }
    }

    /// Case-insensitive content-hash comparison: two entries denote the
    /// same binary iff their hashes match.
    pub fn matches_hash(&self, hash: &str) -> bool {
        self.sha256.eq_ignore_ascii_case(hash)
    }
}
