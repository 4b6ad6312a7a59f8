//! Configuration file management for docchat
//!
//! `config.toml` holds the document folder to index, an optional model name,
//! and named role presets. A missing or broken file never stops the program;
//! defaults are substituted instead.

pub mod directories;

pub use directories::{expand_home, AppDirectories};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::env::apis as env_apis;
use crate::error::{DocChatError, Result};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";

/// Configuration structure matching config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub context_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, RolePreset>,
}

/// A saved persona with its own sampling defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePreset {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Config {
    pub fn with_defaults(dirs: &AppDirectories) -> Self {
        Self {
            context_path: dirs.default_context_path(),
            model: None,
            roles: BTreeMap::new(),
        }
    }

    /// Load configuration from file.
    ///
    /// Returns `defaults` when the file is absent, unreadable or malformed.
    pub fn load_or(path: &Path, defaults: Config) -> Self {
        if !path.exists() {
            return defaults;
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config file unreadable, using defaults");
                return defaults;
            }
        };

        match toml::from_str::<Config>(&contents) {
            Ok(mut config) => {
                config.context_path = expand_home(&config.context_path.to_string_lossy());
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config file malformed, using defaults");
                defaults
            }
        }
    }

    /// Load configuration from the standard location
    pub fn load(dirs: &AppDirectories) -> Self {
        Self::load_or(&dirs.config_file_path(), Self::with_defaults(dirs))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    pub fn set_context_path(&mut self, path: &str) {
        self.context_path = expand_home(path);
    }

    /// Look up a role preset by name
    pub fn role(&self, name: &str) -> Result<&RolePreset> {
        self.roles.get(name).ok_or_else(|| {
            let known = self.roles.keys().cloned().collect::<Vec<_>>().join(", ");
            DocChatError::invalid_config(format!(
                "Unknown role '{name}'. Known roles: [{known}]"
            ))
        })
    }

    /// Model name with priority: environment variable > config file > built-in default
    pub fn resolve_model(&self) -> String {
        if let Ok(model) = std::env::var(env_apis::MODEL) {
            if !model.is_empty() {
                return model;
            }
        }

        self.model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }
}

/// Per-invocation overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub role: Option<String>,
    pub stream: bool,
}

/// Generation options after applying precedence:
/// command-line flag > role preset > built-in default.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    pub role_text: Option<String>,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            stream: false,
            role_text: None,
        }
    }
}

impl ResolvedOptions {
    pub fn resolve(config: &Config, overrides: &OptionOverrides) -> Result<Self> {
        let preset = overrides
            .role
            .as_deref()
            .map(|name| config.role(name))
            .transpose()?;

        let temperature = overrides
            .temperature
            .or_else(|| preset.and_then(|p| p.temperature))
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(DocChatError::validation(
                "temperature".to_string(),
                format!("{temperature} is outside 0.0..=1.0"),
            ));
        }

        let max_tokens = overrides
            .max_tokens
            .or_else(|| preset.and_then(|p| p.max_tokens))
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(DocChatError::validation(
                "max_tokens",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            temperature,
            max_tokens,
            stream: overrides.stream,
            role_text: preset.map(|p| p.role.clone()),
        })
    }
}

/// Read the optional work context file; absent or unreadable yields `None`
pub fn load_work_context(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Work context unreadable, ignoring");
            None
        }
    }
}

/// Get the Anthropic API key from the process environment
pub fn get_anthropic_api_key() -> Option<String> {
    std::env::var(env_apis::ANTHROPIC_API_KEY)
        .ok()
        .filter(|key| !key.is_empty())
}
