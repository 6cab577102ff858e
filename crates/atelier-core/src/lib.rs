//! Atelier Assets - headless library for model asset metadata.
//!
//! Locates, fetches, normalizes and durably caches structured metadata (and
//! preview media) for the model binaries an image-generation host consumes:
//!
//! - [`LocalStore`]: filesystem-backed cache of metadata snapshots, served
//!   from an in-memory index rebuilt at startup
//! - [`CivitaiClient`]: resolves metadata from the remote registry by
//!   content hash or version id
//! - [`Synchronizer`]: scans model directories and backfills missing
//!   entries (hash, resolve, localize, persist)
//! - [`MediaCache`]: bounded LRU cache of preview media
//!
//! There is no global state. Wire the pieces explicitly at your composition
//! root and pass them by handle:
//!
//! ```rust,no_run
//! use atelier_assets::{
//!     CivitaiClient, LocalStore, RegistrySettings, ScanPaths, StorePaths, Synchronizer,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> atelier_assets::Result<()> {
//!     let store = Arc::new(LocalStore::open(StorePaths::new("/data/model-meta"))?);
//!     let registry = Arc::new(CivitaiClient::new(
//!         RegistrySettings::default(),
//!         store.clone(),
//!     )?);
//!
//!     let sync = Synchronizer::new(
//!         store.clone(),
//!         registry,
//!         ScanPaths::new("/data/models/checkpoint", "/data/models/lora"),
//!     );
//!     let report = sync.sync_from_source().await;
//!     println!(
//!         "synced {} models ({} failed, {} skipped)",
//!         report.success, report.failed, report.skipped
//!     );
//!
//!     if let Some(meta) = store.get_by_name("waiIllustriousSDXL_v150") {
//!         // The identifier is what render jobs address the model by.
//!         println!("{}", meta.identifier());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod hashing;
pub mod media_cache;
pub mod models;
pub mod provider;
pub mod registry;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use config::{NetworkConfig, PathsConfig, RegistrySettings, ScanPaths, StorePaths};
pub use error::{AssetError, Result};
pub use hashing::{sha256_file, sha256_file_async};
pub use media_cache::MediaCache;
pub use models::{
    normalize_fallback_count, AssetId, Ecosystem, Example, GenerationArgs, ModelMeta,
    ResourceType,
};
pub use provider::MetaProvider;
pub use registry::CivitaiClient;
pub use store::LocalStore;
pub use sync::{SyncReport, Synchronizer};
