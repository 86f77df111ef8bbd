use serde::{Deserialize, Serialize};

/// Main configuration structure for Plotweave
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Generative text backend configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Tunable heuristic thresholds
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            heuristics: HeuristicsConfig::default(),
        }
    }
}

/// Generative text backend configuration.
///
/// Credentials and model selection live here and are injected into the
/// client constructor; there is no process-wide mutable generator state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeneratorConfig {
    /// API key (can also be set via PLOTWEAVE_GENERATOR__API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the API (for testing/proxies)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed delay between calls in a sequential batch, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

const fn default_batch_delay_ms() -> u64 {
    500
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_request_timeout_secs(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".plotweave/plotweave.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

const fn default_requests_per_second() -> f64 {
    2.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    2000
}

const fn default_max_backoff_ms() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Tunable thresholds for the consistency heuristics. Defaults are the
/// values the heuristics were calibrated with; override with care.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HeuristicsConfig {
    /// Similarity at or above which overlapping outlines are warnings
    #[serde(default = "default_similarity_warn")]
    pub similarity_warn: f64,

    /// Similarity above which overlapping outlines are errors
    #[serde(default = "default_similarity_error")]
    pub similarity_error: f64,

    /// Keyword-match ratio required for events with 4-6 keywords
    #[serde(default = "default_mid_tier_ratio")]
    pub mid_tier_ratio: f64,

    /// Keyword-match ratio required for events with more than 6 keywords
    #[serde(default = "default_long_tier_ratio")]
    pub long_tier_ratio: f64,

    /// Aggregate keyword coverage below which a must-complete event is
    /// reported as likely unfulfilled
    #[serde(default = "default_must_complete_coverage")]
    pub must_complete_coverage: f64,

    /// Chapters remaining at or under which an unresolved thread is imminent
    #[serde(default = "default_imminent_window")]
    pub imminent_window: usize,

    /// Chapters after planting with zero hints before a critical thread is
    /// flagged as neglected
    #[serde(default = "default_neglect_gap")]
    pub neglect_gap: usize,

    /// Chapters before the window max at which resolution becomes mandatory
    #[serde(default = "default_must_resolve_margin")]
    pub must_resolve_margin: usize,

    /// Look-back window for "has this thread been hinted recently"
    #[serde(default = "default_hint_recency_window")]
    pub hint_recency_window: usize,

    /// Chapters before the window max past which hinting is no longer the
    /// suggestion (resolution is)
    #[serde(default = "default_should_hint_margin")]
    pub should_hint_margin: usize,

    /// Char budget the compressed world setting aims for
    #[serde(default = "default_world_setting_budget")]
    pub world_setting_budget: usize,

    /// Hard char cap on the compressed world setting
    #[serde(default = "default_world_setting_cap")]
    pub world_setting_cap: usize,

    /// Maximum characters included in a compressed character digest
    #[serde(default = "default_max_digest_characters")]
    pub max_digest_characters: usize,
}

const fn default_similarity_warn() -> f64 {
    0.5
}

const fn default_similarity_error() -> f64 {
    0.7
}

const fn default_mid_tier_ratio() -> f64 {
    0.75
}

const fn default_long_tier_ratio() -> f64 {
    0.70
}

const fn default_must_complete_coverage() -> f64 {
    0.3
}

const fn default_imminent_window() -> usize {
    5
}

const fn default_neglect_gap() -> usize {
    10
}

const fn default_must_resolve_margin() -> usize {
    2
}

const fn default_hint_recency_window() -> usize {
    10
}

const fn default_should_hint_margin() -> usize {
    5
}

const fn default_world_setting_budget() -> usize {
    200
}

const fn default_world_setting_cap() -> usize {
    250
}

const fn default_max_digest_characters() -> usize {
    3
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            similarity_warn: default_similarity_warn(),
            similarity_error: default_similarity_error(),
            mid_tier_ratio: default_mid_tier_ratio(),
            long_tier_ratio: default_long_tier_ratio(),
            must_complete_coverage: default_must_complete_coverage(),
            imminent_window: default_imminent_window(),
            neglect_gap: default_neglect_gap(),
            must_resolve_margin: default_must_resolve_margin(),
            hint_recency_window: default_hint_recency_window(),
            should_hint_margin: default_should_hint_margin(),
            world_setting_budget: default_world_setting_budget(),
            world_setting_cap: default_world_setting_cap(),
            max_digest_characters: default_max_digest_characters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.generator.timeout_secs, 60);
        assert_eq!(config.generator.batch_delay_ms, 500);
        assert!(config.generator.api_key.is_none());
        assert_eq!(config.heuristics.similarity_error, 0.7);
        assert_eq!(config.heuristics.imminent_window, 5);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"generator":{"model":"gemini-1.5-pro"}}"#).unwrap();
        assert_eq!(config.generator.model, "gemini-1.5-pro");
        assert_eq!(config.generator.timeout_secs, 60);
        assert_eq!(config.heuristics.similarity_warn, 0.5);
    }
}
