use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{GeneratorConfig, RateLimitConfig, RetryConfig};
use crate::domain::ports::{GenerationRequest, QuotaStatus, TextGenerator, TextStream};

use super::errors::GeminiApiError;
use super::rate_limiter::TokenBucketRateLimiter;
use super::retry::RetryPolicy;
use super::streaming::sse_text_stream;
use super::types::{
    GenerateContentRequest, GenerateContentResponse, GenerationSettings, MODEL_CATALOG,
};

/// HTTP client for the Gemini `generateContent` API.
///
/// Every outbound request passes the rate limiter first, then the retry
/// policy. The deadline covers one attempt, not the whole retry loop.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    rate_limiter: TokenBucketRateLimiter,
}

impl GeminiClient {
    pub fn new(
        generator: &GeneratorConfig,
        retry: &RetryConfig,
        rate_limit: &RateLimitConfig,
    ) -> Result<Self, GeminiApiError> {
        let api_key = generator
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(GeminiApiError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: generator.model.clone(),
            base_url: generator.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(generator.timeout_secs),
            retry: RetryPolicy::new(
                retry.max_retries,
                retry.initial_backoff_ms,
                retry.max_backoff_ms,
            ),
            rate_limiter: TokenBucketRateLimiter::new(rate_limit.requests_per_second),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Same client pointed at a different model. Connection pool is shared.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http: self.http.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            retry: self.retry.clone(),
            rate_limiter: self.rate_limiter.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.base_url, self.model, action, self.api_key
        )
    }

    fn build_request(request: GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest::from_prompt(request.prompt).with_settings(GenerationSettings {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        })
    }

    /// One attempt: POST, map the status, pull the text out.
    async fn request_once(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<String, GeminiApiError> {
        let send = async {
            let response = self
                .http
                .post(self.endpoint("generateContent"))
                .json(body)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(GeminiApiError::from_status(status, text));
            }
            let payload: GenerateContentResponse = response.json().await?;
            let text = payload.text();
            if text.is_empty() {
                return Err(GeminiApiError::EmptyResponse);
            }
            Ok(text)
        };
        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(GeminiApiError::Timeout),
        }
    }

    /// Probe the catalog in order and return the first model id that answers
    /// a minimal request. None when every model is exhausted or unreachable.
    #[instrument(skip(self))]
    pub async fn find_available_model(&self) -> Option<&'static str> {
        for info in MODEL_CATALOG {
            let candidate = self.with_model(info.id);
            match candidate.probe().await {
                Ok(()) => {
                    info!(model = info.id, "model responded to probe");
                    return Some(info.id);
                }
                Err(err) => {
                    debug!(model = info.id, error = %err, "model probe failed");
                }
            }
        }
        None
    }

    async fn probe(&self) -> Result<(), GeminiApiError> {
        self.rate_limiter.acquire().await;
        let body = GenerateContentRequest::from_prompt("hi".to_string()).with_settings(
            GenerationSettings {
                temperature: None,
                max_output_tokens: Some(1),
            },
        );
        match self.request_once(&body).await {
            // A reply with no text still proves the key and quota work.
            Ok(_) | Err(GeminiApiError::EmptyResponse) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: GenerationRequest) -> anyhow::Result<String> {
        self.rate_limiter.acquire().await;
        let body = Self::build_request(request);
        let text = self.retry.execute(|| self.request_once(&body)).await?;
        Ok(text)
    }

    /// Streaming generation. No retry: once deltas have been surfaced to the
    /// caller, replaying the request would duplicate them.
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate_stream(&self, request: GenerationRequest) -> anyhow::Result<TextStream> {
        self.rate_limiter.acquire().await;
        let body = Self::build_request(request);
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .http
            .post(url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(GeminiApiError::from)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GeminiApiError::from_status(status, text).into());
        }
        let deltas = sse_text_stream(response.bytes_stream());
        Ok(Box::pin(deltas.map(|item| item.map_err(anyhow::Error::from))))
    }

    /// Minimal request that costs almost nothing, to tell "key and quota
    /// fine" apart from "quota exhausted" before a long batch run.
    async fn check_quota(&self) -> anyhow::Result<QuotaStatus> {
        match self.probe().await {
            Ok(()) => Ok(QuotaStatus {
                available: true,
                model: self.model.clone(),
                message: String::new(),
            }),
            Err(err @ GeminiApiError::QuotaExceeded) => {
                warn!(model = %self.model, "quota exhausted");
                Ok(QuotaStatus {
                    available: false,
                    model: self.model.clone(),
                    message: err.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_base(base_url: &str) -> GeminiClient {
        let generator = GeneratorConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.to_string(),
            ..GeneratorConfig::default()
        };
        GeminiClient::new(
            &generator,
            &RetryConfig::default(),
            &RateLimitConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_api_key_rejected_at_construction() {
        let generator = GeneratorConfig::default();
        let result = GeminiClient::new(
            &generator,
            &RetryConfig::default(),
            &RateLimitConfig::default(),
        );
        assert!(matches!(result, Err(GeminiApiError::MissingApiKey)));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let generator = GeneratorConfig {
            api_key: Some(String::new()),
            ..GeneratorConfig::default()
        };
        let result = GeminiClient::new(
            &generator,
            &RetryConfig::default(),
            &RateLimitConfig::default(),
        );
        assert!(matches!(result, Err(GeminiApiError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_shape() {
        let client = client_with_base("https://example.test/");
        assert_eq!(
            client.endpoint("generateContent"),
            format!(
                "https://example.test/v1beta/models/{}:generateContent?key=test-key",
                client.model()
            )
        );
    }

    #[test]
    fn test_with_model_swaps_only_model() {
        let client = client_with_base("https://example.test");
        let swapped = client.with_model("gemini-1.5-flash");
        assert_eq!(swapped.model(), "gemini-1.5-flash");
        assert_eq!(swapped.base_url, client.base_url);
    }
}
