//! Text embedding backends.
//!
//! Everything downstream only sees the [`Embedder`] trait. The default backend
//! is [`HashingEmbedder`], which needs no model download. Building with the
//! `fastembed` feature swaps in a local all-MiniLM-L6-v2 model.

mod hashing;

#[cfg(feature = "fastembed")]
mod local_model;

pub use hashing::{HashingEmbedder, EMBEDDING_DIM};

#[cfg(feature = "fastembed")]
pub use local_model::FastEmbedder;

use crate::config::AppDirectories;
use crate::error::Result;

/// Converts text into a fixed-dimension vector.
///
/// Vectors from different embedders are not comparable; a store must be
/// populated and queried with the same one.
#[cfg_attr(test, mockall::automock)]
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

/// Pick the embedder this build was compiled with
#[allow(unused_variables)]
pub fn default_embedder(dirs: &AppDirectories) -> Result<Box<dyn Embedder>> {
    #[cfg(feature = "fastembed")]
    {
        let embedder = FastEmbedder::new(dirs.data_dir().join("models"))?;
        Ok(Box::new(embedder))
    }
    #[cfg(not(feature = "fastembed"))]
    {
        Ok(Box::new(HashingEmbedder::new()))
    }
}
