//! LLM provider abstraction layer
//!
//! The dispatcher only talks to [`LlmClient`]; the Anthropic Messages API is
//! the one production implementation, and tests plug in scripted fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ChatMessage, RawResponse};

/// Errors that can occur when using an LLM provider
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Provider not available: {message}")]
    NotAvailable { message: String },

    #[error("Provider error: {message}")]
    ProviderError { message: String },
}

impl LlmError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimit { .. }
                | LlmError::Timeout { .. }
                | LlmError::Network { .. }
                | LlmError::NotAvailable { .. }
        )
    }
}

/// Everything needed for one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Incremental text fragments of a streamed reply
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// Provider-agnostic trait for LLM text generation
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Blocking generation returning the complete reply
    async fn generate(&self, request: &GenerationRequest) -> Result<RawResponse, LlmError>;

    /// Open a streamed generation; fragments arrive in order
    async fn generate_stream(&self, request: &GenerationRequest) -> Result<TextStream, LlmError>;

    /// Get the provider name for logging and debugging
    fn provider_name(&self) -> &'static str;

    /// Get the model identifier being used
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::RateLimit {
            message: "slow down".to_string()
        }
        .is_retryable());
        assert!(LlmError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(!LlmError::Authentication {
            message: "bad key".to_string()
        }
        .is_retryable());
    }
}
