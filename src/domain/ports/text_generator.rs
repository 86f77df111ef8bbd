use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A single generation request. The prompt carries all context; decoding
/// parameters are optional and backend defaults apply when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Result of a minimal quota probe against the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub available: bool,
    pub model: String,
    pub message: String,
}

/// In-order stream of text deltas from one generation.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Port for the opaque generative text service.
///
/// Implementations own retry, rate limiting, and timeout handling; callers
/// see either a final transcript (or stream) or a terminal error.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a complete response for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    /// Generate a response as an in-order stream of text deltas.
    async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream>;

    /// Probe the backend with a minimal request to check quota/credentials.
    async fn check_quota(&self) -> Result<QuotaStatus>;
}
