use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;

use super::errors::{AnthropicError, RetryError};
use super::models::{MessagesRequest, MessagesResponse};
use super::retry::{with_retry, RetryConfig};
use super::sse::{FragmentExtractor, SseDecoder};
use crate::config::{get_anthropic_api_key, DEFAULT_MODEL};
use crate::env::apis as env_vars;
use crate::error::{DocChatError, Result as DocChatResult};
use crate::models::RawResponse;
use crate::services::llm::{GenerationRequest, LlmClient, LlmError, TextStream};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub api_version: String,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl AnthropicConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_version: API_VERSION.to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 3,
        }
    }

    /// Build from `ANTHROPIC_API_KEY`; a missing key is reported before any
    /// request is attempted.
    pub fn from_env() -> DocChatResult<Self> {
        Self::from_api_key(get_anthropic_api_key())
    }

    pub fn from_api_key(api_key: Option<String>) -> DocChatResult<Self> {
        match api_key {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(DocChatError::missing_credential(env_vars::ANTHROPIC_API_KEY)),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn validate(&self) -> Result<(), AnthropicError> {
        if self.api_key.is_empty() {
            return Err(AnthropicError::ConfigurationError {
                message: "Anthropic API key is required".to_string(),
            });
        }

        if self.base_url.is_empty() {
            return Err(AnthropicError::ConfigurationError {
                message: "Base URL cannot be empty".to_string(),
            });
        }

        if self.model.is_empty() {
            return Err(AnthropicError::ConfigurationError {
                message: "Model name cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, AnthropicError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnthropicError::ConfigurationError {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.config.max_retries).with_total_timeout(self.config.timeout)
    }

    fn unwrap_retry(&self, retry_error: RetryError) -> AnthropicError {
        match retry_error {
            RetryError::NonRetryable { source } => source,
            RetryError::MaxAttemptsExceeded { last } => last,
            RetryError::TimeoutExceeded => AnthropicError::Timeout {
                timeout_ms: self.timeout_ms(),
            },
        }
    }

    /// Non-streamed `POST /messages`
    pub async fn create_message(
        &self,
        request: &MessagesRequest,
    ) -> Result<MessagesResponse, AnthropicError> {
        tracing::debug!(
            model = %request.model,
            estimated_tokens = request.estimate_tokens(),
            "Sending message request"
        );

        let response = with_retry(self.retry_config(), || self.send_once(request))
            .await
            .map_err(|e| self.unwrap_retry(e))?;

        let response_text = response
            .text()
            .await
            .map_err(|e| AnthropicError::from_reqwest_error(e, self.timeout_ms()))?;

        let parsed: MessagesResponse =
            serde_json::from_str(&response_text).map_err(|e| AnthropicError::ParseError {
                message: format!("Failed to parse response: {e}"),
            })?;

        parsed
            .validate()
            .map_err(|e| AnthropicError::InvalidResponse { message: e })?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Message completed"
            );
        }

        Ok(parsed)
    }

    /// Streamed `POST /messages`; yields text fragments as they arrive.
    ///
    /// Only opening the connection is retried. Once fragments have been
    /// handed out, a failure ends the stream with an error.
    pub async fn stream_message(
        &self,
        request: &MessagesRequest,
    ) -> Result<BoxStream<'static, Result<String, AnthropicError>>, AnthropicError> {
        let response = with_retry(self.retry_config(), || self.send_once(request))
            .await
            .map_err(|e| self.unwrap_retry(e))?;

        Ok(Box::pin(text_fragments(response, self.timeout_ms())))
    }

    async fn send_once(&self, request: &MessagesRequest) -> Result<Response, AnthropicError> {
        let url = format!("{}/messages", self.config.base_url);

        let response = timeout(
            self.config.timeout,
            self.client
                .post(&url)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", &self.config.api_version)
                .header("Content-Type", "application/json")
                .json(request)
                .send(),
        )
        .await
        .map_err(|_| AnthropicError::Timeout {
            timeout_ms: self.timeout_ms(),
        })?
        .map_err(|e| AnthropicError::from_reqwest_error(e, self.timeout_ms()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = retry_after_header(response.headers());
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(AnthropicError::from_status_and_body(status, &error_body).with_retry_after(retry_after))
    }
}

/// `retry-after` in whole seconds; HTTP-date values are ignored
fn retry_after_header(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Decode a streamed message body into text fragments
fn text_fragments(
    response: Response,
    timeout_ms: u64,
) -> impl Stream<Item = Result<String, AnthropicError>> + Send + 'static {
    try_stream! {
        let mut bytes = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut fragments = FragmentExtractor::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| AnthropicError::from_reqwest_error(e, timeout_ms))?;
            for event in decoder.push(&chunk) {
                if let Some(text) = fragments.on_sse_event(&event)? {
                    yield text;
                }
            }
            if fragments.is_finished() {
                break;
            }
        }

        if let Some(event) = decoder.finish() {
            if let Some(text) = fragments.on_sse_event(&event)? {
                yield text;
            }
        }

        if !fragments.is_finished() {
            Err::<(), _>(AnthropicError::StreamError {
                message: "connection closed before message_stop".to_string(),
            })?;
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<RawResponse, LlmError> {
        let body = MessagesRequest::from_generation(&self.config.model, request, false);
        let response = self.create_message(&body).await?;

        Ok(RawResponse::Segments(response.segments()))
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<TextStream, LlmError> {
        let body = MessagesRequest::from_generation(&self.config.model, request, true);
        let stream = self.stream_message(&body).await?;

        Ok(Box::pin(stream.map(|item| item.map_err(LlmError::from))))
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
