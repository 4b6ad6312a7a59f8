use thiserror::Error;

use super::models::ApiErrorBody;
use crate::services::llm::LlmError;

#[derive(Debug, Error)]
pub enum AnthropicError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {source}")]
    NetworkError { source: reqwest::Error },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Anthropic API overloaded: {message}")]
    Overloaded {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Stream interrupted: {message}")]
    StreamError { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl AnthropicError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AnthropicError::RateLimitExceeded { .. } => true,
            AnthropicError::Timeout { .. } => true,
            AnthropicError::NetworkError { .. } => true,
            AnthropicError::Overloaded { .. } => true,
            AnthropicError::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-requested wait, falling back to a fixed pause per class
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            AnthropicError::RateLimitExceeded { retry_after, .. } => Some(retry_after.unwrap_or(10)),
            AnthropicError::Overloaded { retry_after, .. } => Some(retry_after.unwrap_or(5)),
            _ => None,
        }
    }

    /// Attach the `retry-after` value sent with a throttling response
    pub fn with_retry_after(mut self, seconds: Option<u64>) -> Self {
        if let AnthropicError::RateLimitExceeded { retry_after, .. }
        | AnthropicError::Overloaded { retry_after, .. } = &mut self
        {
            *retry_after = seconds;
        }
        self
    }

    pub fn from_reqwest_error(error: reqwest::Error, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            AnthropicError::Timeout { timeout_ms }
        } else if let Some(status) = error.status() {
            let message = error.to_string();
            match status.as_u16() {
                401 => AnthropicError::AuthenticationFailed { message },
                403 => AnthropicError::PermissionDenied { message },
                429 => AnthropicError::RateLimitExceeded {
                    message,
                    retry_after: None,
                },
                529 => AnthropicError::Overloaded {
                    message,
                    retry_after: None,
                },
                code @ 500..=599 => AnthropicError::ServerError {
                    status: code,
                    message,
                },
                _ => AnthropicError::InvalidRequest { message },
            }
        } else {
            AnthropicError::NetworkError { source: error }
        }
    }

    pub fn from_status_and_body(status: reqwest::StatusCode, body: &str) -> Self {
        let status_code = status.as_u16();

        // Error bodies look like {"type":"error","error":{"type":..,"message":..}}
        let error_message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string());

        match status_code {
            400 | 404 | 413 => AnthropicError::InvalidRequest {
                message: error_message,
            },
            401 => AnthropicError::AuthenticationFailed {
                message: error_message,
            },
            403 => AnthropicError::PermissionDenied {
                message: error_message,
            },
            429 => AnthropicError::RateLimitExceeded {
                message: error_message,
                retry_after: None,
            },
            503 | 529 => AnthropicError::Overloaded {
                message: error_message,
                retry_after: None,
            },
            500..=599 => AnthropicError::ServerError {
                status: status_code,
                message: error_message,
            },
            _ => AnthropicError::InvalidRequest {
                message: format!("HTTP {status_code}: {error_message}"),
            },
        }
    }

    /// Classify an `error` event received mid-stream
    pub fn from_api_error(error: &ApiErrorBody) -> Self {
        let message = error.message.clone();
        match error.kind.as_str() {
            "authentication_error" => AnthropicError::AuthenticationFailed { message },
            "permission_error" => AnthropicError::PermissionDenied { message },
            "rate_limit_error" => AnthropicError::RateLimitExceeded {
                message,
                retry_after: None,
            },
            "overloaded_error" => AnthropicError::Overloaded {
                message,
                retry_after: None,
            },
            "api_error" => AnthropicError::ServerError {
                status: 500,
                message,
            },
            "invalid_request_error" | "not_found_error" | "request_too_large" => {
                AnthropicError::InvalidRequest { message }
            }
            _ => AnthropicError::StreamError {
                message: format!("{}: {message}", error.kind),
            },
        }
    }
}

impl From<AnthropicError> for LlmError {
    fn from(error: AnthropicError) -> Self {
        match error {
            AnthropicError::AuthenticationFailed { message }
            | AnthropicError::PermissionDenied { message } => LlmError::Authentication { message },
            AnthropicError::RateLimitExceeded { message, .. } => LlmError::RateLimit { message },
            AnthropicError::Timeout { timeout_ms } => LlmError::Timeout { timeout_ms },
            AnthropicError::NetworkError { source } => LlmError::Network {
                message: source.to_string(),
            },
            AnthropicError::StreamError { message } => LlmError::Network { message },
            AnthropicError::Overloaded { message, .. } => LlmError::NotAvailable { message },
            AnthropicError::ParseError { message } | AnthropicError::InvalidResponse { message } => {
                LlmError::InvalidResponse { message }
            }
            AnthropicError::ConfigurationError { message } => LlmError::Configuration { message },
            other @ (AnthropicError::InvalidRequest { .. } | AnthropicError::ServerError { .. }) => {
                LlmError::ProviderError {
                    message: other.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("Maximum retry attempts exceeded: {last}")]
    MaxAttemptsExceeded { last: AnthropicError },

    #[error("Retry timeout exceeded")]
    TimeoutExceeded,

    #[error("Non-retryable error: {source}")]
    NonRetryable { source: AnthropicError },
}
