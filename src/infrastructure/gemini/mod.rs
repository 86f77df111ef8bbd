//! Gemini API adapter implementing the [`TextGenerator`] port.
//!
//! [`TextGenerator`]: crate::domain::ports::TextGenerator

pub mod client;
pub mod errors;
pub mod rate_limiter;
pub mod retry;
pub mod streaming;
pub mod types;

pub use client::GeminiClient;
pub use errors::GeminiApiError;
pub use rate_limiter::TokenBucketRateLimiter;
pub use retry::RetryPolicy;
pub use types::{ModelInfo, MODEL_CATALOG};
