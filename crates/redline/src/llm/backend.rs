//! Generation backend trait and shared request/error types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::TierConfig;

/// Failure of one generation call.
///
/// These are values, never panics: the orchestrator turns any of them into
/// a fallback rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The per-request deadline elapsed.
    #[error("generation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The service could not be reached.
    #[error("failed to connect to generation service: {0}")]
    Connect(String),

    /// The service answered with a non-success status.
    #[error("generation service error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The requested model is not installed on the service.
    #[error("model '{0}' not found on generation service")]
    ModelNotFound(String),

    /// The service answered with no text.
    #[error("generation service returned an empty response")]
    EmptyResponse,

    /// The response body could not be decoded.
    #[error("failed to decode generation response: {0}")]
    Decode(String),

    /// Any other transport-level failure.
    #[error("generation request failed: {0}")]
    Transport(String),
}

impl GenerationError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Connect(_) | GenerationError::Transport(_) => true,
            GenerationError::Status { status, .. } => *status >= 500,
            GenerationError::Timeout { .. }
            | GenerationError::ModelNotFound(_)
            | GenerationError::EmptyResponse
            | GenerationError::Decode(_) => false,
        }
    }

    /// Short reason string recorded on degraded suggestions.
    pub fn reason(&self) -> String {
        match self {
            GenerationError::Timeout { .. } => "timeout".to_string(),
            GenerationError::Connect(_) => "unreachable".to_string(),
            GenerationError::Status { status, .. } => format!("status {}", status),
            GenerationError::ModelNotFound(model) => format!("model '{}' not found", model),
            GenerationError::EmptyResponse => "empty response".to_string(),
            GenerationError::Decode(_) => "undecodable response".to_string(),
            GenerationError::Transport(_) => "transport error".to_string(),
        }
    }
}

/// Sampling options sent with a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    /// Maximum tokens to generate.
    pub num_predict: u32,
    /// Context window.
    pub num_ctx: u32,
}

/// One fully-specified call to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    pub model: String,
    pub prompt: String,
    pub system: String,
    pub options: GenerationOptions,
}

impl GenerationCall {
    /// Build a call from a prompt and the tier's model configuration.
    pub fn from_tier(prompt: impl Into<String>, system: impl Into<String>, config: &TierConfig) -> Self {
        Self {
            model: config.model.clone(),
            prompt: prompt.into(),
            system: system.into(),
            options: GenerationOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                num_predict: config.max_tokens,
                num_ctx: config.context_window,
            },
        }
    }
}

/// A text-generation service.
///
/// Implementations perform a single attempt; deadlines and retries are
/// applied by [`GenerationClient`](super::GenerationClient).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for a call.
    async fn generate(&self, call: &GenerationCall) -> Result<String, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{IntelligenceTier, TierTable};

    #[test]
    fn test_retryable_errors() {
        assert!(GenerationError::Connect("refused".into()).is_retryable());
        assert!(GenerationError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(!GenerationError::Status { status: 400, body: String::new() }.is_retryable());
        assert!(!GenerationError::Timeout { after_ms: 10 }.is_retryable());
        assert!(!GenerationError::ModelNotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_call_from_tier() {
        let table = TierTable::default();
        let call = GenerationCall::from_tier("p", "s", table.get(IntelligenceTier::Deep));

        assert_eq!(call.model, table.deep.model);
        assert_eq!(call.options.num_predict, table.deep.max_tokens);
        assert_eq!(call.options.num_ctx, table.deep.context_window);
    }

    #[test]
    fn test_reason_is_short() {
        assert_eq!(GenerationError::Timeout { after_ms: 5 }.reason(), "timeout");
        assert_eq!(
            GenerationError::Status { status: 502, body: "bad gateway".into() }.reason(),
            "status 502"
        );
    }
}
