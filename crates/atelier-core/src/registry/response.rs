//! Registry response envelope.
//!
//! The version endpoints return a nested model/files/images document. The
//! envelope is parsed permissively where the registry is permissive (image
//! generation metadata is frequently absent or partial) and strictly where
//! the contract matters: a success response without an AIR identifier, a
//! primary file, or a content hash is a contract violation, not a miss.

use crate::error::{AssetError, Result};
use crate::models::{AssetId, Example, GenerationArgs, ModelMeta};
use serde::Deserialize;

/// Envelope of `/api/v1/model-versions/{id}` and `…/by-hash/{hash}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionResponse {
    /// Version label (e.g. "v15.0").
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// AIR identifier carrying ecosystem, type and the id pair.
    #[serde(default)]
    pub air: Option<String>,
    #[serde(default)]
    pub base_model: Option<String>,
    #[serde(default)]
    pub trained_words: Vec<String>,
    #[serde(default)]
    pub model: Option<ModelInfo>,
    #[serde(default)]
    pub files: Vec<FileInfo>,
    #[serde(default)]
    pub images: Vec<ImageInfo>,
}

/// Parent-model substructure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModelInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileInfo {
    pub name: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub hashes: FileHashes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileHashes {
    #[serde(rename = "SHA256", default)]
    pub sha256: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageInfo {
    #[serde(default)]
    pub url: Option<String>,
    /// Actual media dimensions.
    #[serde(default)]
    pub metadata: ImageDims,
    /// Embedded generation parameters; absent for hand-uploaded media.
    #[serde(default)]
    pub meta: Option<ImageMeta>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImageDims {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageMeta {
    #[serde(rename = "Model", default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub cfg_scale: Option<f64>,
    #[serde(default)]
    pub sampler: Option<String>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub clip_skip: Option<u32>,
}

impl VersionResponse {
    /// Normalize the envelope into the canonical metadata shape.
    ///
    /// `request_url` is only used for error context.
    pub(crate) fn into_model_meta(self, base_url: &str, request_url: &str) -> Result<ModelMeta> {
        let malformed = |message: String| AssetError::MalformedResponse {
            url: request_url.to_string(),
            message,
        };

        let air = self
            .air
            .as_deref()
            .ok_or_else(|| malformed("missing air identifier".to_string()))?;
        let id = AssetId::parse_lossy(air)
            .map_err(|e| malformed(format!("unparseable air identifier: {}", e)))?;

        let file = self
            .files
            .first()
            .ok_or_else(|| malformed("empty files array".to_string()))?;
        let sha256 = file
            .hashes
            .sha256
            .as_deref()
            .ok_or_else(|| malformed("primary file has no SHA256 hash".to_string()))?
            .to_lowercase();

        let examples = self
            .images
            .iter()
            .map(|image| {
                let meta = image.meta.as_ref();
                let args = GenerationArgs {
                    model: meta.and_then(|m| m.model.clone()).unwrap_or_default(),
                    prompt: meta.and_then(|m| m.prompt.clone()).unwrap_or_default(),
                    negative_prompt: meta
                        .and_then(|m| m.negative_prompt.clone())
                        .unwrap_or_default(),
                    steps: meta.and_then(|m| m.steps).unwrap_or(20),
                    cfg_scale: meta.and_then(|m| m.cfg_scale).unwrap_or(7.0),
                    sampler: meta
                        .and_then(|m| m.sampler.clone())
                        .unwrap_or_else(|| "Euler a".to_string()),
                    seed: meta.and_then(|m| m.seed).unwrap_or(-1),
                    width: image.metadata.width.unwrap_or(512),
                    height: image.metadata.height.unwrap_or(512),
                    clip_skip: meta.and_then(|m| m.clip_skip),
                };
                Example {
                    url: image.url.clone(),
                    args,
                }
            })
            .collect();

        let display_name = self
            .model
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| self.name.clone());
        let description = self
            .model
            .as_ref()
            .and_then(|m| m.description.clone())
            .or(self.description);
        let base_model = self
            .base_model
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        Ok(ModelMeta {
            filename: file.name.clone(),
            name: display_name,
            version: self.name,
            description,
            model_id: id.model_id,
            version_id: id.version_id,
            kind: id.resource_type,
            ecosystem: id.ecosystem,
            base_model,
            sha256,
            trained_words: self.trained_words,
            download_url: file.download_url.clone(),
            web_page_url: Some(format!(
                "{}/models/{}?modelVersionId={}",
                base_url, id.model_id, id.version_id
            )),
            examples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ecosystem, ResourceType};

    const URL: &str = "https://civitai.com/api/v1/model-versions/390021";

    fn envelope_json() -> serde_json::Value {
        serde_json::json!({
            "name": "v15.0",
            "air": "urn:air:sdxl:model:civitai:348620@390021",
            "baseModel": "Illustrious",
            "trainedWords": ["masterpiece"],
            "model": {
                "name": "WAI Illustrious",
                "description": "An anime checkpoint",
                "type": "Checkpoint"
            },
            "files": [{
                "name": "waiIllustriousSDXL_v150.safetensors",
                "downloadUrl": "https://civitai.com/api/download/models/390021",
                "hashes": { "SHA256": "AABB".repeat(16) }
            }],
            "images": [
                {
                    "url": "https://image.civitai.com/w/1.jpeg",
                    "metadata": { "width": 832, "height": 1216 },
                    "meta": {
                        "Model": "waiIllustriousSDXL_v150",
                        "prompt": "1girl",
                        "negativePrompt": "lowres",
                        "steps": 28,
                        "cfgScale": 5.5,
                        "sampler": "Euler a",
                        "seed": 123456,
                        "clipSkip": 2
                    }
                },
                {
                    "url": "https://image.civitai.com/w/2.jpeg",
                    "metadata": {}
                }
            ]
        })
    }

    #[test]
    fn test_full_envelope_normalizes() {
        let envelope: VersionResponse = serde_json::from_value(envelope_json()).unwrap();
        let meta = envelope
            .into_model_meta("https://civitai.com", URL)
            .unwrap();

        assert_eq!(meta.filename, "waiIllustriousSDXL_v150.safetensors");
        assert_eq!(meta.name, "WAI Illustrious");
        assert_eq!(meta.version, "v15.0");
        assert_eq!(meta.model_id, 348620);
        assert_eq!(meta.version_id, 390021);
        // AIR labels checkpoints "model"; normalization maps it back.
        assert_eq!(meta.kind, ResourceType::Checkpoint);
        assert_eq!(meta.ecosystem, Ecosystem::Sdxl);
        assert_eq!(meta.base_model.as_deref(), Some("Illustrious"));
        assert_eq!(meta.sha256, "aabb".repeat(16));
        assert_eq!(
            meta.web_page_url.as_deref(),
            Some("https://civitai.com/models/348620?modelVersionId=390021")
        );

        assert_eq!(meta.examples.len(), 2);
        let first = &meta.examples[0];
        assert_eq!(first.args.steps, 28);
        assert_eq!(first.args.width, 832);
        assert_eq!(first.args.clip_skip, Some(2));
        // Second image carries no generation metadata: defaults apply.
        let second = &meta.examples[1];
        assert_eq!(second.args.steps, 20);
        assert_eq!(second.args.sampler, "Euler a");
        assert_eq!(second.args.width, 512);
    }

    #[test]
    fn test_missing_air_is_malformed() {
        let mut json = envelope_json();
        json.as_object_mut().unwrap().remove("air");
        let envelope: VersionResponse = serde_json::from_value(json).unwrap();
        let err = envelope
            .into_model_meta("https://civitai.com", URL)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedResponse { .. }));
    }

    #[test]
    fn test_empty_files_is_malformed() {
        let mut json = envelope_json();
        json["files"] = serde_json::json!([]);
        let envelope: VersionResponse = serde_json::from_value(json).unwrap();
        let err = envelope
            .into_model_meta("https://civitai.com", URL)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedResponse { .. }));
    }

    #[test]
    fn test_missing_sha256_is_malformed() {
        let mut json = envelope_json();
        json["files"][0]["hashes"] = serde_json::json!({});
        let envelope: VersionResponse = serde_json::from_value(json).unwrap();
        let err = envelope
            .into_model_meta("https://civitai.com", URL)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedResponse { .. }));
    }

    #[test]
    fn test_model_name_falls_back_to_version_name() {
        let mut json = envelope_json();
        json.as_object_mut().unwrap().remove("model");
        let envelope: VersionResponse = serde_json::from_value(json).unwrap();
        let meta = envelope
            .into_model_meta("https://civitai.com", URL)
            .unwrap();
        assert_eq!(meta.name, "v15.0");
    }
}
