use serde::{Deserialize, Serialize};

/// A ranked document selected as context for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    pub path: String,
    /// Leading slice of the file content, read at retrieval time
    pub preview: String,
}

impl RetrievedDocument {
    /// Render as a context block for the generation request
    pub fn to_context_block(&self) -> String {
        format!("Content from {}:\n{}", self.path, self.preview)
    }
}

/// Similarity of one stored path to a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPath {
    pub path: String,
    pub score: f32,
}
