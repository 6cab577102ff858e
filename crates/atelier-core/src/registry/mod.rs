//! Remote metadata registry client.
//!
//! Resolves model metadata from the Civitai API by content hash or version
//! id and normalizes the response envelope into [`ModelMeta`]. A miss (any
//! non-success status) is `Ok(None)`; a success response with an invalid
//! payload is a hard [`MalformedResponse`](crate::AssetError::MalformedResponse)
//! error, since it signals an upstream contract break rather than "not found".

mod response;

use crate::config::{NetworkConfig, RegistrySettings};
use crate::error::{AssetError, Result};
use crate::models::ModelMeta;
use crate::store::LocalStore;
use reqwest::header;
use response::VersionResponse;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client for the remote model registry.
///
/// Holds one configured `reqwest::Client`; the optional bearer credential
/// from [`RegistrySettings`] is attached to every outgoing request. The
/// local store handle is used to persist resolved metadata on `save`.
pub struct CivitaiClient {
    http: reqwest::Client,
    settings: RegistrySettings,
    pub(crate) store: Arc<LocalStore>,
}

impl CivitaiClient {
    /// Create a client from settings, wired to the given store.
    pub fn new(settings: RegistrySettings, store: Arc<LocalStore>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = &settings.api_key {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AssetError::Other(format!("Invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(NetworkConfig::USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| AssetError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            http,
            settings,
            store,
        })
    }

    /// Resolve metadata for the model version matching a content hash.
    pub async fn resolve_by_hash(&self, hash: &str) -> Result<Option<ModelMeta>> {
        let url = format!(
            "{}/api/v1/model-versions/by-hash/{}",
            self.settings.base_url_trimmed(),
            hash
        );
        self.fetch_version(&url).await
    }

    /// Resolve metadata for a model version by its registry id.
    pub async fn resolve_by_version_id(&self, version_id: u64) -> Result<Option<ModelMeta>> {
        let url = format!(
            "{}/api/v1/model-versions/{}",
            self.settings.base_url_trimmed(),
            version_id
        );
        self.fetch_version(&url).await
    }

    /// Check whether the registry is reachable.
    pub async fn test_connectivity(&self) -> bool {
        let url = format!("{}/api/v1/models", self.settings.base_url_trimmed());
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Registry connectivity check failed: {}", e);
                false
            }
        }
    }

    async fn fetch_version(&self, url: &str) -> Result<Option<ModelMeta>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("Registry has no entry at {} (status {})", url, status);
            return Ok(None);
        }

        let envelope: VersionResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                AssetError::MalformedResponse {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            } else {
                AssetError::from(e)
            }
        })?;

        let meta = envelope.into_model_meta(self.settings.base_url_trimmed(), url)?;
        info!("Resolved {} from registry", meta.version_name());
        Ok(Some(meta))
    }
}
