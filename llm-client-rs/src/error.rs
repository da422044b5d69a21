// llm-client-rs/src/error.rs
// Error type for completion calls
//
// Variants distinguish transient failures (worth another attempt by a
// caller-owned retry policy) from ones that need intervention.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// 400, 401, 403, 404 or a request rejected before sending
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 429
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// 500, 502, 503, 504
    #[error("Server error: {0}")]
    Server(String),

    /// Connection failures and other transport problems
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The call succeeded but produced no usable text
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Any other unclassified status
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited(_) | LlmError::Server(_) | LlmError::Network(_) | LlmError::Timeout(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout(_))
    }
}
