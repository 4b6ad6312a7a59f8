//! Similarity-ranked lookup of indexed documents.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::embedding::Embedder;
use crate::error::Result;
use crate::models::{RetrievedDocument, ScoredPath};
use crate::vector_store::VectorStore;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Clone)]
pub struct Retriever {
    top_k: usize,
    preview_chars: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl Retriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Score every stored vector against `query`.
    ///
    /// Sorted by descending similarity; equal scores are ordered by path so
    /// the result never depends on map iteration order.
    pub fn rank(&self, query: &[f32], store: &VectorStore) -> Vec<ScoredPath> {
        let mut scored: Vec<ScoredPath> = store
            .iter()
            .map(|(path, embedding)| ScoredPath {
                path: path.to_string(),
                score: cosine_similarity(query, embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.path.cmp(&b.path))
        });

        scored
    }

    /// Find the `top_k` documents most similar to `query`.
    ///
    /// An empty store is a normal outcome and yields no documents. Files that
    /// can no longer be read are skipped.
    pub fn retrieve(
        &self,
        query: &str,
        store: &VectorStore,
        embedder: &dyn Embedder,
    ) -> Result<Vec<RetrievedDocument>> {
        if store.is_empty() {
            warn!("Vector store is empty, no context available. Run `docchat index` first");
            return Ok(Vec::new());
        }

        let query_embedding = embedder.embed(query)?;
        Ok(self.retrieve_with_embedding(&query_embedding, store))
    }

    /// Same as [`Retriever::retrieve`] for an already embedded query
    pub fn retrieve_with_embedding(
        &self,
        query_embedding: &[f32],
        store: &VectorStore,
    ) -> Vec<RetrievedDocument> {
        if store.is_empty() {
            return Vec::new();
        }

        let documents: Vec<RetrievedDocument> = self
            .rank(query_embedding, store)
            .into_iter()
            .take(self.top_k)
            .filter_map(|scored| {
                debug!(path = %scored.path, score = scored.score, "Selected document");
                self.read_preview(&scored.path)
                    .map(|preview| RetrievedDocument {
                        path: scored.path,
                        preview,
                    })
            })
            .collect();

        info!("Retrieved {} relevant documents", documents.len());
        documents
    }

    fn read_preview(&self, path: &str) -> Option<String> {
        match fs::read_to_string(Path::new(path)) {
            Ok(content) => Some(truncate_chars(&content, self.preview_chars)),
            Err(e) => {
                warn!(path = %path, error = %e, "Indexed document unreadable, skipping");
                None
            }
        }
    }
}

/// Cosine similarity in `[-1, 1]`.
///
/// Mismatched lengths, zero-magnitude vectors and non-finite components
/// score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    let similarity = dot / denom;
    if !similarity.is_finite() || denom <= f64::EPSILON {
        return 0.0;
    }

    similarity.clamp(-1.0, 1.0) as f32
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
