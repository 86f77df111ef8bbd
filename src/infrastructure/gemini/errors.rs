use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the Gemini API
#[derive(Error, Debug)]
pub enum GeminiApiError {
    /// No API key configured at all
    #[error("未配置API密钥，请在设置中填写 Gemini API Key")]
    MissingApiKey,

    /// Invalid API key (HTTP 401)
    #[error("API密钥无效，请检查设置中的 Gemini API Key")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("API访问被拒绝: {0}")]
    Forbidden(String),

    /// Model not found (HTTP 404)
    #[error("模型不存在: {0}")]
    ModelNotFound(String),

    /// Invalid request parameters (HTTP 400)
    #[error("请求参数错误: {0}")]
    InvalidRequest(String),

    /// Quota exhausted (HTTP 429). Retrying burns more quota for nothing,
    /// so this is treated as permanent: switch model or wait for the reset.
    #[error("API配额已用尽，请更换模型或等待配额重置（免费额度按天刷新）")]
    QuotaExceeded,

    /// Server error (HTTP 500, 502, 503, 504)
    #[error("服务器错误 ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error
    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),

    /// Request exceeded the configured deadline
    #[error("请求超时，请检查网络或稍后重试")]
    Timeout,

    /// Response arrived but carried no usable text
    #[error("模型返回了空响应")]
    EmptyResponse,

    /// JSON serialization/deserialization error
    #[error("JSON处理错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeminiApiError {
    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeminiApiError::ServerError(_, _) | GeminiApiError::Timeout | GeminiApiError::Network(_)
        )
    }

    /// Returns true if this is a permanent error that should not be retried
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            GeminiApiError::MissingApiKey
                | GeminiApiError::InvalidApiKey
                | GeminiApiError::Forbidden(_)
                | GeminiApiError::ModelNotFound(_)
                | GeminiApiError::InvalidRequest(_)
                | GeminiApiError::QuotaExceeded
        )
    }

    /// Map an HTTP status plus response body to the right variant.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => GeminiApiError::InvalidRequest(body),
            StatusCode::UNAUTHORIZED => GeminiApiError::InvalidApiKey,
            StatusCode::FORBIDDEN => GeminiApiError::Forbidden(body),
            StatusCode::NOT_FOUND => GeminiApiError::ModelNotFound(body),
            StatusCode::TOO_MANY_REQUESTS => GeminiApiError::QuotaExceeded,
            s if s.is_server_error() => GeminiApiError::ServerError(s, body),
            s => GeminiApiError::ServerError(s, body),
        }
    }
}
