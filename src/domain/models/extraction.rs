//! Structured payloads decoded from generative model output.
//!
//! Model output is untrusted text that usually contains JSON, often wrapped
//! in a code fence or surrounded by chatter. Every payload here decodes
//! leniently: unknown fields are ignored, missing fields default, and a
//! completely unparseable response yields the canonical empty value instead
//! of an error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A brand-new entity reported by chapter analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedEntity {
    pub name: String,
    /// Free-form type string; resolved against [`EntityType`] leniently.
    #[serde(rename = "type")]
    pub entity_type: String,
    pub aliases: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeChange {
    pub key: String,
    pub value: String,
}

/// Attribute updates for an entity already in the codex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityUpdate {
    pub name: String,
    pub attribute_changes: Vec<AttributeChange>,
}

/// A relation between two named entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedRelation {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Full entity-extraction payload for one chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityExtraction {
    pub new_entities: Vec<ExtractedEntity>,
    pub entity_updates: Vec<EntityUpdate>,
    pub new_relations: Vec<ExtractedRelation>,
}

/// A plot thread the model spotted being planted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectedThread {
    pub description: String,
    /// Free-form importance string; resolved against [`Importance`] leniently.
    pub importance: String,
    pub related_characters: Vec<String>,
    pub expected_chapters_to_resolve: Option<usize>,
}

/// A hint the model matched to an existing thread id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectedHint {
    pub thread_id: String,
    pub hint: String,
}

/// Full plot-detection payload for one chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlotDetection {
    pub new_threads: Vec<DetectedThread>,
    pub hints: Vec<DetectedHint>,
    /// Ids of existing threads the chapter resolved.
    pub resolved: Vec<String>,
}

/// A death the model observed in a chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObservedDeath {
    pub name: String,
    pub cause: String,
}

/// Character-centric analysis of one chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterCharacterAnalysis {
    /// Names of characters appearing on the page.
    pub appearances: Vec<String>,
    pub deaths: Vec<ObservedDeath>,
    pub relationships: Vec<ExtractedRelation>,
}

/// Key points distilled from a volume summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyPointsPayload {
    pub key_points: Vec<String>,
}

/// Book title suggestions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TitleSuggestions {
    pub titles: Vec<String>,
}

/// Cut the JSON body out of raw model output. Handles ```json fences and
/// leading/trailing prose around a bare object.
fn json_body(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }
    if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }
    let open = trimmed.find('{')?;
    let close = trimmed.rfind('}')?;
    if close > open {
        Some(&trimmed[open..=close])
    } else {
        None
    }
}

/// Decode a payload from raw model output, absorbing any failure into the
/// payload's default value.
pub fn decode_lenient<T: DeserializeOwned + Default>(raw: &str) -> T {
    let Some(body) = json_body(raw) else {
        warn!("model output contained no JSON body, using empty payload");
        return T::default();
    };
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "failed to decode model JSON, using empty payload");
            T::default()
        }
    }
}
