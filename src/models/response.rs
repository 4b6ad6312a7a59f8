//! Reply shapes returned by the generation capability.
//!
//! Streaming produces plain text, while a batched call returns the provider's
//! content blocks. Both are folded into one string by [`normalize`] before
//! anything is printed or stored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentSegment {
    Text {
        text: String,
    },
    /// Any non-text block (tool use, thinking, ...), kept verbatim
    Other {
        kind: String,
        payload: serde_json::Value,
    },
}

impl ContentSegment {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentSegment::Text { text } => Some(text),
            ContentSegment::Other { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawResponse {
    Text(String),
    Segments(Vec<ContentSegment>),
}

impl From<String> for RawResponse {
    fn from(text: String) -> Self {
        RawResponse::Text(text)
    }
}

/// Collapse a raw reply into its canonical string.
///
/// Text segments are joined with a blank line; non-text segments are dropped.
/// Normalizing an already normalized string returns it unchanged.
pub fn normalize(raw: &RawResponse) -> String {
    match raw {
        RawResponse::Text(text) => text.clone(),
        RawResponse::Segments(segments) => segments
            .iter()
            .filter_map(ContentSegment::as_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}
