use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::env::paths as env_paths;

/// Application directory manager using the platform XDG layout.
///
/// Setting `DOCCHAT_HOME` collapses config and data into a single directory,
/// which is also how tests get an isolated layout.
#[derive(Debug, Clone)]
pub struct AppDirectories {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppDirectories {
    /// Resolve directories from `DOCCHAT_HOME` or the platform defaults
    pub fn new() -> Result<Self> {
        if let Ok(home) = std::env::var(env_paths::HOME) {
            if !home.is_empty() {
                return Ok(Self::rooted_at(expand_home(&home)));
            }
        }

        let project_dirs = ProjectDirs::from("dev", "docchat", "docchat")
            .context("Failed to determine project directories")?;

        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
            data_dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Keep every file under one root directory
    pub fn rooted_at<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        Self {
            config_dir: root.clone(),
            data_dir: root,
        }
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the application config file path
    pub fn config_file_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Persisted work context appended to every system prompt
    pub fn work_context_path(&self) -> PathBuf {
        self.config_dir.join("work_context.md")
    }

    pub fn vector_store_path(&self) -> PathBuf {
        self.data_dir.join("vector_store.bin")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn saved_dir(&self) -> PathBuf {
        self.data_dir.join("saved")
    }

    pub fn last_interaction_path(&self) -> PathBuf {
        self.saved_dir().join("last_interaction.json")
    }

    /// Default folder of documents to index
    pub fn default_context_path(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    /// Ensure all necessary directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        let dirs_to_create = [self.config_dir.clone(), self.data_dir.clone(), self.saved_dir()];

        for dir in &dirs_to_create {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }

        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }

    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(path)
}
