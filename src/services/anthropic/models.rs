use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{ChatMessage, ContentSegment};
use crate::services::llm::GenerationRequest;

/// Body of `POST /v1/messages`
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub system: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl MessagesRequest {
    pub fn from_generation(model: &str, request: &GenerationRequest, stream: bool) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system_prompt.clone(),
            messages: request.messages.clone(),
            stream,
        }
    }

    pub fn estimate_tokens(&self) -> u32 {
        // Simple token estimation - roughly 4 characters per token
        let total_chars: usize = self.system.len()
            + self
                .messages
                .iter()
                .map(|message| message.content.len())
                .sum::<usize>();

        (total_chars / 4).max(1) as u32
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub content: Vec<Value>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

impl MessagesResponse {
    /// Content blocks in order; text blocks become text segments
    pub fn segments(&self) -> Vec<ContentSegment> {
        self.content.iter().map(segment_from_block).collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.stop_reason.as_deref() {
            None | Some("end_turn") | Some("max_tokens") | Some("stop_sequence") => Ok(()),
            Some("tool_use") => Ok(()),
            Some(reason) => Err(format!("Unexpected stop reason: {reason}")),
        }
    }
}

fn segment_from_block(block: &Value) -> ContentSegment {
    let kind = block.get("type").and_then(Value::as_str).unwrap_or("unknown");

    match (kind, block.get("text").and_then(Value::as_str)) {
        ("text", Some(text)) => ContentSegment::text(text),
        _ => ContentSegment::Other {
            kind: kind.to_string(),
            payload: block.clone(),
        },
    }
}

/// `{"type": "error", "error": {"type": .., "message": ..}}`
#[derive(Debug, Deserialize, Clone)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Server-sent events of a streamed message
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        #[serde(default)]
        message: Value,
    },
    ContentBlockStart {
        index: usize,
        content_block: Value,
    },
    ContentBlockDelta {
        index: usize,
        delta: Delta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        #[serde(default)]
        delta: Value,
    },
    MessageStop,
    Ping,
    Error {
        error: ApiErrorBody,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}
