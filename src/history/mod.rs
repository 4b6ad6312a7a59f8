//! Bounded conversation history persisted as JSON.
//!
//! The file keeps the last [`PERSISTED_TURNS`] exchanges; only the last
//! [`CONTEXT_TURNS`] of those are replayed into a new request.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::ConversationTurn;

pub const PERSISTED_TURNS: usize = 10;
pub const CONTEXT_TURNS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    path: Option<PathBuf>,
}

impl ConversationHistory {
    /// A history that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the history file, recovering whatever is salvageable.
    ///
    /// This never fails: unreadable or malformed files produce an empty
    /// history and a diagnostic, and individual bad entries are dropped.
    pub fn load(path: &Path) -> Self {
        let turns = match fs::read_to_string(path) {
            Ok(contents) => {
                debug!(
                    path = %path.display(),
                    characters = contents.len(),
                    "Loaded context history file"
                );
                parse_turns(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unable to read context history, starting empty");
                Vec::new()
            }
        };

        let mut history = Self {
            turns,
            path: Some(path.to_path_buf()),
        };
        history.trim();
        history
    }

    /// Record a finished exchange, trim to the persisted window, then save.
    pub fn append(&mut self, turn: ConversationTurn) -> Result<()> {
        turn.validate()?;
        self.turns.push(turn);
        self.trim();
        self.save()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.turns.clear();
        self.save()
    }

    /// Trailing turns to replay into the next request
    pub fn context_slice(&self) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(CONTEXT_TURNS);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn trim(&mut self) {
        if self.turns.len() > PERSISTED_TURNS {
            let excess = self.turns.len() - PERSISTED_TURNS;
            self.turns.drain(..excess);
        }
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.turns)?)?;

        Ok(())
    }
}

fn parse_turns(contents: &str) -> Vec<ConversationTurn> {
    let value: Value = match serde_json::from_str(contents) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                line = e.line(),
                column = e.column(),
                excerpt = %excerpt(contents, e.line(), e.column()),
                error = %e,
                "Error decoding context history JSON, starting empty"
            );
            return Vec::new();
        }
    };

    let Value::Array(entries) = value else {
        warn!("Context history is not a JSON array, starting empty");
        return Vec::new();
    };

    let total = entries.len();
    let turns: Vec<ConversationTurn> = entries.iter().filter_map(turn_from_value).collect();

    if turns.len() < total {
        warn!(
            dropped = total - turns.len(),
            kept = turns.len(),
            "Discarded malformed context history entries"
        );
    }

    turns
}

/// Accepts `{"human": .., "assistant": ..}` or the legacy `[human, assistant]` pair
fn turn_from_value(value: &Value) -> Option<ConversationTurn> {
    let (human, assistant) = match value {
        Value::Object(map) => (map.get("human")?.as_str()?, map.get("assistant")?.as_str()?),
        Value::Array(pair) if pair.len() == 2 => (pair[0].as_str()?, pair[1].as_str()?),
        _ => return None,
    };

    ConversationTurn::new(human, assistant).ok()
}

/// Up to 20 characters either side of a parse error position.
///
/// `column` is serde_json's 1-based byte column.
fn excerpt(contents: &str, line: usize, column: usize) -> String {
    let Some(text) = contents.lines().nth(line.saturating_sub(1)) else {
        return String::new();
    };

    let byte_offset = column.saturating_sub(1);
    let chars: Vec<char> = text.chars().collect();
    let position = text
        .char_indices()
        .take_while(|(index, _)| *index < byte_offset)
        .count();
    let start = position.saturating_sub(20);
    let end = (position + 20).min(chars.len());

    chars[start..end].iter().collect()
}
