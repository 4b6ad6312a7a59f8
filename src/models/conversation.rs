use serde::{Deserialize, Serialize};

use crate::error::{DocChatError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of a generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A completed exchange: what the user asked and what came back.
///
/// Both sides are non-empty once constructed through [`ConversationTurn::new`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub human: String,
    pub assistant: String,
}

impl ConversationTurn {
    pub fn new<H: Into<String>, A: Into<String>>(human: H, assistant: A) -> Result<Self> {
        let turn = Self {
            human: human.into(),
            assistant: assistant.into(),
        };
        turn.validate()?;
        Ok(turn)
    }

    pub fn validate(&self) -> Result<()> {
        if self.human.trim().is_empty() {
            return Err(DocChatError::validation("human", "must not be empty"));
        }
        if self.assistant.trim().is_empty() {
            return Err(DocChatError::validation("assistant", "must not be empty"));
        }
        Ok(())
    }

    /// The pair of messages this turn contributes to a request
    pub fn to_messages(&self) -> [ChatMessage; 2] {
        [
            ChatMessage::user(self.human.clone()),
            ChatMessage::assistant(self.assistant.clone()),
        ]
    }
}
