use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Snapshot of the most recent exchange, rewritten after every query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastInteraction {
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub response: String,
}

impl LastInteraction {
    pub fn new<P: Into<String>, R: Into<String>>(prompt: P, response: R) -> Self {
        Self {
            timestamp: Utc::now(),
            prompt: prompt.into(),
            response: response.into(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
