//! Incremental server-sent-events decoding.
//!
//! Network chunks can split lines (and UTF-8 sequences) anywhere, so bytes
//! are buffered until a full line is available.

use bytes::BytesMut;

use super::errors::AnthropicError;
use super::models::{Delta, StreamEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw = self.buffer.split_to(newline + 1);
            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }

        events
    }

    /// Flush a trailing event that was not followed by a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let raw = self.buffer.split();
            let line = String::from_utf8_lossy(&raw).into_owned();
            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                return Some(event);
            }
        }
        self.process_line("")
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            if self.event.is_none() && self.data.is_empty() {
                return None;
            }
            let data = self.data.join("\n");
            self.data.clear();
            return Some(SseEvent {
                event: self.event.take(),
                data,
            });
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }

        None
    }
}

/// Turns message stream events into printable text fragments.
///
/// A blank line is emitted between consecutive text blocks so the streamed
/// text matches the joined content of a non-streamed reply.
#[derive(Debug, Default)]
pub struct FragmentExtractor {
    text_blocks: usize,
    finished: bool,
}

impl FragmentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn on_sse_event(&mut self, event: &SseEvent) -> Result<Option<String>, AnthropicError> {
        if event.data.is_empty() {
            return Ok(None);
        }

        let parsed: StreamEvent =
            serde_json::from_str(&event.data).map_err(|e| AnthropicError::ParseError {
                message: format!("Failed to parse stream event: {e}"),
            })?;

        self.on_event(parsed)
    }

    pub fn on_event(&mut self, event: StreamEvent) -> Result<Option<String>, AnthropicError> {
        match event {
            StreamEvent::ContentBlockStart { content_block, .. } => {
                let is_text = content_block.get("type").and_then(|t| t.as_str()) == Some("text");
                if !is_text {
                    return Ok(None);
                }

                self.text_blocks += 1;
                let initial = content_block
                    .get("text")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default();
                let separator = if self.text_blocks > 1 { "\n\n" } else { "" };
                let fragment = format!("{separator}{initial}");

                Ok((!fragment.is_empty()).then_some(fragment))
            }
            StreamEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
                ..
            } => Ok((!text.is_empty()).then_some(text)),
            StreamEvent::MessageStop => {
                self.finished = true;
                Ok(None)
            }
            StreamEvent::Error { error } => Err(AnthropicError::from_api_error(&error)),
            _ => Ok(None),
        }
    }
}
