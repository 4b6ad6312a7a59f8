use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use tracing::info;

use super::Embedder;
use crate::error::{DocChatError, Result};

/// Local all-MiniLM-L6-v2 embeddings via FastEmbed.
///
/// The model is downloaded into `cache_dir` on first use.
pub struct FastEmbedder {
    model: TextEmbedding,
}

impl FastEmbedder {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        let init_options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(true);

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            DocChatError::embedding(format!("Failed to initialize embedding model: {e}"))
        })?;
        info!("Embedding model all-MiniLM-L6-v2 loaded");

        Ok(Self { model })
    }
}

impl Embedder for FastEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .embed(vec![text], None)
            .map_err(|e| DocChatError::embedding(format!("Failed to generate embedding: {e}")))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DocChatError::embedding("No embedding returned"))
    }

    fn dimensions(&self) -> usize {
        384
    }
}
