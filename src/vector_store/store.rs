use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::embedding::Embedder;
use crate::error::{DocChatError, Result};

/// Mapping from document path to its embedding vector.
///
/// Keys are unique; indexing a path again overwrites its vector. Entries are
/// kept in a `BTreeMap` so iteration order is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorStore {
    entries: BTreeMap<String, Vec<f32>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from disk. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No vector store on disk, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let store: VectorStore = bincode::deserialize(&bytes).map_err(|e| {
            DocChatError::vector_store(format!(
                "Failed to decode vector store {}: {e}. Run `docchat clear-index` to rebuild it",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), entries = store.len(), "Vector store loaded");

        Ok(store)
    }

    /// Overwrite the store file with the current contents
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes)?;
        debug!(path = %path.display(), entries = self.len(), "Vector store saved");

        Ok(())
    }

    /// Embed `content` and store it under `path`, replacing any previous vector
    pub fn add(&mut self, path: &str, content: &str, embedder: &dyn Embedder) -> Result<()> {
        let embedding = embedder.embed(content)?;
        self.entries.insert(path.to_string(), embedding);
        Ok(())
    }

    /// Read and index one file. Failures are logged and the file is skipped.
    ///
    /// Returns whether the file ended up in the store.
    pub fn add_file(&mut self, path: &Path, embedder: &dyn Embedder) -> bool {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error indexing file, skipping");
                return false;
            }
        };

        let key = path.to_string_lossy();
        match self.add(&key, &content, embedder) {
            Ok(()) => {
                info!(path = %path.display(), "Indexed");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error embedding file, skipping");
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&[f32]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Entries in ascending path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries
            .iter()
            .map(|(path, embedding)| (path.as_str(), embedding.as_slice()))
    }

    /// Insert a precomputed vector
    pub fn insert(&mut self, path: impl Into<String>, embedding: Vec<f32>) {
        self.entries.insert(path.into(), embedding);
    }
}
