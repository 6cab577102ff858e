//! Asset metadata data model.
//!
//! [`identifier`] holds the canonical AIR identifier codec and the
//! ecosystem/resource-type vocabulary; [`meta`] holds the metadata
//! aggregate persisted in each asset's `metadata.json`.

pub mod identifier;
pub mod meta;

pub use identifier::{normalize_fallback_count, AssetId, Ecosystem, ResourceType};
pub use meta::{is_local_url, local_path, Example, GenerationArgs, ModelMeta};
