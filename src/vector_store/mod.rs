//! Persistent path → embedding index.
//!
//! The store is a plain value: it is loaded once, mutated in memory, and
//! written back whole. Nothing about it is global, so tests can build as many
//! independent stores as they like.

mod store;

pub use store::VectorStore;
