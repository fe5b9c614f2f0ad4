//! Error types for research operations
//!
//! These errors never reach the HTTP caller. Provider clients, the tool
//! registry, the researcher, and the analyst convert them into empty values
//! or failure strings at their own boundary and log them.

use thiserror::Error;

/// Research service errors
#[derive(Debug, Error)]
pub enum DelphiError {
    /// Upstream answered with a non-2xx status
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Upstream answered 2xx but the payload is unusable
    #[error("Malformed payload from {provider}: {reason}")]
    MalformedPayload {
        provider: &'static str,
        reason: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Language-model error
    #[error("Model error: {0}")]
    Model(#[from] delphi_llm::LLMError),

    /// Prompt template error
    #[error("Prompt template error: {0}")]
    Prompt(#[from] minijinja::Error),

    /// I/O error (listener bind, serve)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chart rendering error
    #[error("Chart error: {0}")]
    Chart(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for research operations
pub type Result<T> = std::result::Result<T, DelphiError>;

impl From<delphi_utils::EnvError> for DelphiError {
    fn from(err: delphi_utils::EnvError) -> Self {
        DelphiError::Config(err.to_string())
    }
}
