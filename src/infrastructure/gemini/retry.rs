use super::errors::GeminiApiError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy with linear-capped backoff for Gemini API requests.
///
/// Backoff grows per attempt: initial, 2x initial, 3x initial, capped at the
/// maximum. Only transient errors (network, timeout, 5xx) are retried;
/// quota exhaustion and auth failures fail fast.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try
    max_retries: u32,
    /// Backoff step in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 2_000,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_retries` - Maximum retry attempts (recommended: 2)
    /// * `initial_backoff_ms` - Backoff step per attempt (recommended: 2000ms)
    /// * `max_backoff_ms` - Backoff ceiling (recommended: 5000ms)
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        assert!(
            initial_backoff_ms > 0,
            "initial_backoff_ms must be greater than 0"
        );
        assert!(
            max_backoff_ms >= initial_backoff_ms,
            "max_backoff_ms must be >= initial_backoff_ms"
        );
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Execute an operation, retrying transient failures with backoff.
    ///
    /// # Returns
    /// * `Ok(T)` - Operation succeeded
    /// * `Err(GeminiApiError)` - Permanent error, or retries exhausted
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, GeminiApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GeminiApiError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(&err, attempt) => {
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient API error, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    debug!(error = %err, "giving up on API request");
                    return Err(err);
                }
            }
        }
    }

    fn should_retry(&self, err: &GeminiApiError, attempt: u32) -> bool {
        err.is_transient() && attempt < self.max_retries
    }

    /// Backoff for a given zero-based attempt: (attempt+1) * initial, capped.
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let step = self
            .initial_backoff_ms
            .saturating_mul(u64::from(attempt) + 1);
        Duration::from_millis(step.min(self.max_backoff_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_linear_then_capped() {
        let policy = RetryPolicy::new(3, 2_000, 5_000);
        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(2_000));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(4_000));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(5_000));
        assert_eq!(policy.calculate_backoff(10), Duration::from_millis(5_000));
    }

    #[tokio::test]
    async fn test_transient_error_retried_until_success() {
        let policy = RetryPolicy::new(2, 1, 5);
        let calls = AtomicU32::new(0);
        let result = policy
            .execute(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(GeminiApiError::ServerError(
                        StatusCode::SERVICE_UNAVAILABLE,
                        "unavailable".to_string(),
                    ))
                } else {
                    Ok("ok")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_quota_error_not_retried() {
        let policy = RetryPolicy::new(3, 1, 5);
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GeminiApiError::QuotaExceeded)
            })
            .await;
        assert!(matches!(result, Err(GeminiApiError::QuotaExceeded)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let policy = RetryPolicy::new(2, 1, 5);
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GeminiApiError::Timeout)
            })
            .await;
        assert!(matches!(result, Err(GeminiApiError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
