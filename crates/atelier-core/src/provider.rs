//! The seam between local and remote metadata providers.
//!
//! Both the [`LocalStore`] (in-memory index over the durable cache) and the
//! [`CivitaiClient`] (remote registry) answer the same questions; consumers
//! like the synchronization orchestrator depend only on this trait and get
//! handed concrete providers at the composition root.

use crate::error::Result;
use crate::models::ModelMeta;
use crate::registry::CivitaiClient;
use crate::store::LocalStore;
use async_trait::async_trait;
use tracing::debug;

/// Uniform interface over metadata sources.
///
/// "Not found" is `Ok(None)` for every resolve method; errors are reserved
/// for transport failures and contract violations.
#[async_trait]
pub trait MetaProvider: Send + Sync {
    /// Resolve by content hash (case-insensitive).
    async fn resolve_by_hash(&self, hash: &str) -> Result<Option<ModelMeta>>;

    /// Resolve by registry version id.
    async fn resolve_by_version_id(&self, version_id: u64) -> Result<Option<ModelMeta>>;

    /// Resolve by model name or filename. Not every provider can answer
    /// this; unsupported providers return `Ok(None)`.
    async fn resolve_by_name(&self, name: &str) -> Result<Option<ModelMeta>>;

    /// Whether this provider is currently usable.
    async fn test(&self) -> bool;

    /// Persist a metadata snapshot durably and return it as written.
    async fn save(&self, meta: ModelMeta) -> Result<ModelMeta>;
}

#[async_trait]
impl MetaProvider for LocalStore {
    async fn resolve_by_hash(&self, hash: &str) -> Result<Option<ModelMeta>> {
        Ok(self.get_by_hash(hash))
    }

    async fn resolve_by_version_id(&self, version_id: u64) -> Result<Option<ModelMeta>> {
        Ok(self.get_by_version_id(version_id))
    }

    async fn resolve_by_name(&self, name: &str) -> Result<Option<ModelMeta>> {
        Ok(self.get_by_name(name))
    }

    /// The local store is always usable.
    async fn test(&self) -> bool {
        true
    }

    async fn save(&self, meta: ModelMeta) -> Result<ModelMeta> {
        LocalStore::save(self, meta).await
    }
}

#[async_trait]
impl MetaProvider for CivitaiClient {
    async fn resolve_by_hash(&self, hash: &str) -> Result<Option<ModelMeta>> {
        CivitaiClient::resolve_by_hash(self, hash).await
    }

    async fn resolve_by_version_id(&self, version_id: u64) -> Result<Option<ModelMeta>> {
        CivitaiClient::resolve_by_version_id(self, version_id).await
    }

    /// The registry has no name-to-single-result endpoint; answered locally
    /// with `None`, no network call is made.
    async fn resolve_by_name(&self, name: &str) -> Result<Option<ModelMeta>> {
        debug!("Registry does not support name lookup: {}", name);
        Ok(None)
    }

    async fn test(&self) -> bool {
        self.test_connectivity().await
    }

    /// Resolution and storage are separate responsibilities: saving is
    /// delegated to the local store this client was wired to.
    async fn save(&self, meta: ModelMeta) -> Result<ModelMeta> {
        self.store.save(meta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RegistrySettings, StorePaths};
    use crate::models::{Ecosystem, ResourceType};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_meta() -> ModelMeta {
        ModelMeta {
            filename: "tweaker.safetensors".into(),
            name: "Tweaker".into(),
            version: "v2".into(),
            description: None,
            model_id: 1,
            version_id: 2,
            kind: ResourceType::Lora,
            ecosystem: Ecosystem::Sd1,
            base_model: None,
            sha256: "0a".repeat(32),
            trained_words: vec![],
            download_url: None,
            web_page_url: None,
            examples: vec![],
        }
    }

    #[tokio::test]
    async fn test_local_store_provider_lookups() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(StorePaths::new(temp.path())).unwrap();
        store.save(sample_meta()).await.unwrap();

        let provider: &dyn MetaProvider = &store;
        assert!(provider.test().await);
        assert!(provider
            .resolve_by_hash(&"0A".repeat(32))
            .await
            .unwrap()
            .is_some());
        assert!(provider.resolve_by_version_id(2).await.unwrap().is_some());
        assert!(provider
            .resolve_by_name("tweaker")
            .await
            .unwrap()
            .is_some());
        assert!(provider.resolve_by_name("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registry_provider_name_lookup_is_unsupported() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::open(StorePaths::new(temp.path())).unwrap());
        let client = CivitaiClient::new(RegistrySettings::default(), store).unwrap();

        let provider: &dyn MetaProvider = &client;
        // Answered without touching the network.
        assert!(provider.resolve_by_name("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registry_provider_save_delegates_to_store() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::open(StorePaths::new(temp.path())).unwrap());
        let client = CivitaiClient::new(RegistrySettings::default(), store.clone()).unwrap();

        let provider: &dyn MetaProvider = &client;
        provider.save(sample_meta()).await.unwrap();
        assert!(store.get_by_version_id(2).is_some());
    }
}
