//! Canonical asset identifier (AIR) codec.
//!
//! Assets are addressed downstream by an AIR-style URN:
//!
//! ```text
//! urn:air:{ecosystem}:{resource_type}:civitai:{model_id}@{version_id}
//! ```
//!
//! `Display` composes the canonical form and `FromStr` parses it back;
//! the two are exact inverses for every valid identifier. Remote payloads
//! use a wider set of resource-type labels than the canonical three, so
//! [`AssetId::parse_lossy`] additionally routes historical labels through
//! [`ResourceType::normalize`].

use crate::error::{AssetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Registry source segment of the URN. Only one registry is supported.
const SOURCE: &str = "civitai";

/// Count of resource-type labels that fell back to `checkpoint` during
/// normalization. Unrecognized labels must not fail ingestion, so the
/// fallback is silent; hosts watch this counter to notice label drift.
static NORMALIZE_FALLBACKS: AtomicU64 = AtomicU64::new(0);

/// Number of resource-type normalizations that hit the lossy
/// default-to-checkpoint fallback since process start.
pub fn normalize_fallback_count() -> u64 {
    NORMALIZE_FALLBACKS.load(Ordering::Relaxed)
}

/// Technical generation a model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Sd1,
    Sd2,
    Sdxl,
}

impl Ecosystem {
    /// Return the canonical lowercase string for this ecosystem.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Sd1 => "sd1",
            Ecosystem::Sd2 => "sd2",
            Ecosystem::Sdxl => "sdxl",
        }
    }
}

impl FromStr for Ecosystem {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sd1" => Ok(Ecosystem::Sd1),
            "sd2" => Ok(Ecosystem::Sd2),
            "sdxl" => Ok(Ecosystem::Sdxl),
            other => Err(AssetError::InvalidIdentifier {
                value: other.to_string(),
                reason: "unknown ecosystem".to_string(),
            }),
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of model asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Full model checkpoint
    Checkpoint,
    /// Low-rank adapter
    Lora,
    /// Variational autoencoder weights
    Vae,
}

impl ResourceType {
    /// Return the canonical lowercase string for this resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Checkpoint => "checkpoint",
            ResourceType::Lora => "lora",
            ResourceType::Vae => "vae",
        }
    }

    /// Map a remote resource-type label onto the canonical three.
    ///
    /// The registry has labeled low-rank adapters `LyCORIS`, `LoCon`,
    /// `LoHa` and `LoKr` over the years, and labels checkpoints `model`
    /// inside AIR strings. Unrecognized labels fall back to `Checkpoint`
    /// so ingestion never fails on a new label; every fallback increments
    /// the counter behind [`normalize_fallback_count`].
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "checkpoint" | "model" => ResourceType::Checkpoint,
            "lora" | "lycoris" | "locon" | "loha" | "lokr" => ResourceType::Lora,
            "vae" => ResourceType::Vae,
            other => {
                NORMALIZE_FALLBACKS.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Unrecognized resource type {:?}, falling back to checkpoint",
                    other
                );
                ResourceType::Checkpoint
            }
        }
    }
}

impl FromStr for ResourceType {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "checkpoint" => Ok(ResourceType::Checkpoint),
            "lora" => Ok(ResourceType::Lora),
            "vae" => Ok(ResourceType::Vae),
            other => Err(AssetError::InvalidIdentifier {
                value: other.to_string(),
                reason: "unknown resource type".to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured asset identifier: ecosystem, resource type and the
/// registry's (model id, version id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId {
    pub ecosystem: Ecosystem,
    pub resource_type: ResourceType,
    pub model_id: u64,
    pub version_id: u64,
}

impl AssetId {
    /// Parse an identifier, normalizing non-canonical resource-type labels
    /// instead of rejecting them.
    ///
    /// Use this for identifiers received from the registry; use the strict
    /// `FromStr` impl for identifiers this crate composed itself.
    pub fn parse_lossy(s: &str) -> Result<Self> {
        let (ecosystem, resource_type, model_id, version_id) = split_urn(s)?;
        Ok(Self {
            ecosystem: ecosystem.parse()?,
            resource_type: ResourceType::normalize(resource_type),
            model_id,
            version_id,
        })
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "urn:air:{}:{}:{}:{}@{}",
            self.ecosystem, self.resource_type, SOURCE, self.model_id, self.version_id
        )
    }
}

impl FromStr for AssetId {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self> {
        let (ecosystem, resource_type, model_id, version_id) = split_urn(s)?;
        Ok(Self {
            ecosystem: ecosystem.parse()?,
            resource_type: resource_type.parse()?,
            model_id,
            version_id,
        })
    }
}

/// Split a URN into its raw fields, validating everything except the
/// ecosystem/type vocabulary: exactly six colon-separated fields, the
/// fixed `urn:air:…:civitai:` skeleton, and numeric `model@version` ids.
fn split_urn(s: &str) -> Result<(&str, &str, u64, u64)> {
    let invalid = |reason: &str| AssetError::InvalidIdentifier {
        value: s.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = s.trim().split(':').collect();
    if fields.len() != 6 {
        return Err(invalid("expected 6 colon-separated fields"));
    }
    if fields[0] != "urn" || fields[1] != "air" {
        return Err(invalid("missing urn:air prefix"));
    }
    if fields[4] != SOURCE {
        return Err(invalid("unsupported source"));
    }

    let (model_id, version_id) = fields[5]
        .split_once('@')
        .ok_or_else(|| invalid("missing @version suffix"))?;
    let model_id: u64 = model_id
        .parse()
        .map_err(|_| invalid("model id is not numeric"))?;
    let version_id: u64 = version_id
        .parse()
        .map_err(|_| invalid("version id is not numeric"))?;

    Ok((fields[2], fields[3], model_id, version_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose() {
        let id = AssetId {
            ecosystem: Ecosystem::Sdxl,
            resource_type: ResourceType::Lora,
            model_id: 328553,
            version_id: 368189,
        };
        assert_eq!(id.to_string(), "urn:air:sdxl:lora:civitai:328553@368189");
    }

    #[test]
    fn test_roundtrip_all_variants() {
        for ecosystem in [Ecosystem::Sd1, Ecosystem::Sd2, Ecosystem::Sdxl] {
            for resource_type in [
                ResourceType::Checkpoint,
                ResourceType::Lora,
                ResourceType::Vae,
            ] {
                let id = AssetId {
                    ecosystem,
                    resource_type,
                    model_id: 348620,
                    version_id: 390021,
                };
                let parsed: AssetId = id.to_string().parse().unwrap();
                assert_eq!(parsed, id);
            }
        }
    }

    #[test]
    fn test_parse_rejects_bad_grammar() {
        for s in [
            "",
            "urn:air:sd1:checkpoint:civitai:348620",      // no version
            "urn:air:sd1:checkpoint:civitai:abc@390021",  // non-numeric id
            "urn:air:sd1:checkpoint:civitai:348620@x",    // non-numeric version
            "urn:air:sd1:checkpoint:348620@390021",       // missing field
            "urn:foo:sd1:checkpoint:civitai:348620@390021", // wrong prefix
            "urn:air:sd1:checkpoint:huggingface:348620@390021", // wrong source
            "urn:air:flux:checkpoint:civitai:348620@390021", // unknown ecosystem
        ] {
            assert!(s.parse::<AssetId>().is_err(), "accepted {:?}", s);
        }
    }

    #[test]
    fn test_strict_parse_rejects_remote_labels() {
        assert!("urn:air:sd1:model:civitai:2421@43533"
            .parse::<AssetId>()
            .is_err());
    }

    #[test]
    fn test_parse_lossy_normalizes_remote_labels() {
        let id = AssetId::parse_lossy("urn:air:sd1:model:civitai:2421@43533").unwrap();
        assert_eq!(id.resource_type, ResourceType::Checkpoint);

        let id = AssetId::parse_lossy("urn:air:sdxl:LyCORIS:civitai:328553@368189").unwrap();
        assert_eq!(id.resource_type, ResourceType::Lora);
    }

    #[test]
    fn test_normalize_known_labels() {
        assert_eq!(ResourceType::normalize("Checkpoint"), ResourceType::Checkpoint);
        assert_eq!(ResourceType::normalize("LyCORIS"), ResourceType::Lora);
        assert_eq!(ResourceType::normalize("LoCon"), ResourceType::Lora);
        assert_eq!(ResourceType::normalize("vae"), ResourceType::Vae);
    }

    #[test]
    fn test_normalize_fallback_increments_counter() {
        let before = normalize_fallback_count();
        assert_eq!(
            ResourceType::normalize("TextualInversion"),
            ResourceType::Checkpoint
        );
        assert!(normalize_fallback_count() > before);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ResourceType::Checkpoint).unwrap(),
            "\"checkpoint\""
        );
        assert_eq!(serde_json::to_string(&Ecosystem::Sdxl).unwrap(), "\"sdxl\"");
    }
}
