//! Wire types for the Gemini `generateContent` REST API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationSettings>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: None,
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        if settings.temperature.is_some() || settings.max_output_tokens.is_some() {
            self.generation_config = Some(settings);
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: ResponseContent,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, empty when absent.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// A known model with display metadata for pickers and probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub recommended: bool,
}

/// Catalog of supported models, in probing order.
pub const MODEL_CATALOG: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-3-flash-preview",
        display_name: "Gemini 3 Flash（推荐，速度快）",
        recommended: true,
    },
    ModelInfo {
        id: "gemini-3-pro-preview",
        display_name: "Gemini 3 Pro（质量高，配额少）",
        recommended: false,
    },
    ModelInfo {
        id: "gemini-2.0-flash-exp",
        display_name: "Gemini 2.0 Flash 实验版",
        recommended: false,
    },
    ModelInfo {
        id: "gemini-1.5-pro",
        display_name: "Gemini 1.5 Pro",
        recommended: false,
    },
    ModelInfo {
        id: "gemini-1.5-flash",
        display_name: "Gemini 1.5 Flash",
        recommended: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest::from_prompt("你好".to_string());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "你好");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_settings_serialized_camel_case() {
        let request = GenerateContentRequest::from_prompt("hi".to_string()).with_settings(
            GenerationSettings {
                temperature: Some(0.8),
                max_output_tokens: Some(2048),
            },
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"第一段"},{"text":"第二段"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), "第一段第二段");
    }

    #[test]
    fn test_empty_response_yields_empty_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_catalog_has_single_recommendation() {
        assert_eq!(MODEL_CATALOG.iter().filter(|m| m.recommended).count(), 1);
    }
}
