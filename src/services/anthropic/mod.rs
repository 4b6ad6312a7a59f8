//! Anthropic Messages API client

pub mod client;
pub mod errors;
pub mod models;
pub mod retry;
pub mod sse;

pub use client::{AnthropicClient, AnthropicConfig};
pub use errors::{AnthropicError, RetryError};
pub use models::{MessagesRequest, MessagesResponse, StreamEvent};
pub use retry::{with_retry, RetryConfig, RetryHandler};
pub use sse::{FragmentExtractor, SseDecoder, SseEvent};
