use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ResolvedOptions;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::history::ConversationHistory;
use crate::models::{normalize, ConversationTurn, LastInteraction, RetrievedDocument};
use crate::retrieval::Retriever;
use crate::services::dispatcher::Dispatcher;
use crate::vector_store::VectorStore;

/// Where a single query is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Idle,
    EmbeddingQuery,
    Retrieving,
    Dispatching { streaming: bool },
    Assembling,
    Persisting,
}

impl fmt::Display for InteractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionPhase::Idle => write!(f, "idle"),
            InteractionPhase::EmbeddingQuery => write!(f, "embedding-query"),
            InteractionPhase::Retrieving => write!(f, "retrieving"),
            InteractionPhase::Dispatching { streaming: true } => write!(f, "dispatching(streaming)"),
            InteractionPhase::Dispatching { streaming: false } => write!(f, "dispatching(batched)"),
            InteractionPhase::Assembling => write!(f, "assembling"),
            InteractionPhase::Persisting => write!(f, "persisting"),
        }
    }
}

/// What one query produced
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOutcome {
    pub prompt: String,
    pub response: String,
    pub retrieved: Vec<RetrievedDocument>,
    /// Set when the reply text is a generation error message
    pub remote_error: Option<String>,
    /// Whether the turn was appended to the conversation history
    pub recorded: bool,
}

/// A chat over the indexed documents.
///
/// Every query runs retrieval, dispatch and persistence to completion before
/// the next one starts.
pub struct ChatSession {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    history: ConversationHistory,
    dispatcher: Dispatcher,
    snapshot_path: Option<PathBuf>,
    phase: InteractionPhase,
}

impl ChatSession {
    pub fn new(
        store: VectorStore,
        embedder: Arc<dyn Embedder>,
        history: ConversationHistory,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            store,
            embedder,
            retriever: Retriever::new(),
            history,
            dispatcher,
            snapshot_path: None,
            phase: InteractionPhase::Idle,
        }
    }

    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = retriever;
        self
    }

    /// Write a [`LastInteraction`] snapshot here after every query
    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    fn enter(&mut self, phase: InteractionPhase) {
        debug!(from = %self.phase, to = %phase, "Interaction phase");
        self.phase = phase;
    }

    /// Answer one query.
    ///
    /// Retrieval problems degrade to an answer without context. A failed
    /// generation call still completes: its error text becomes the reply,
    /// the snapshot records it, and history is left untouched.
    pub async fn ask<F>(
        &mut self,
        query: &str,
        options: &ResolvedOptions,
        on_fragment: F,
    ) -> Result<InteractionOutcome>
    where
        F: FnMut(&str),
    {
        let retrieved = self.retrieve(query);

        self.enter(InteractionPhase::Dispatching {
            streaming: options.stream,
        });
        let dispatched = self
            .dispatcher
            .dispatch(query, &self.history, &retrieved, options, on_fragment)
            .await;

        self.enter(InteractionPhase::Assembling);
        let response = normalize(&dispatched.response);

        let recorded = self.persist(query, &response, dispatched.remote_error.is_none());
        self.enter(InteractionPhase::Idle);

        Ok(InteractionOutcome {
            prompt: query.to_string(),
            response,
            retrieved,
            remote_error: dispatched.remote_error,
            recorded,
        })
    }

    fn retrieve(&mut self, query: &str) -> Vec<RetrievedDocument> {
        self.enter(InteractionPhase::EmbeddingQuery);
        if self.store.is_empty() {
            self.enter(InteractionPhase::Retrieving);
            warn!("No context available: the vector store is empty");
            return Vec::new();
        }

        let query_embedding = match self.embedder.embed(query) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Failed to embed query, continuing without context");
                return Vec::new();
            }
        };

        self.enter(InteractionPhase::Retrieving);
        self.retriever
            .retrieve_with_embedding(&query_embedding, &self.store)
    }

    /// Returns whether the turn was appended to history.
    ///
    /// Write failures are logged; the reply has already been produced.
    fn persist(&mut self, query: &str, response: &str, succeeded: bool) -> bool {
        self.enter(InteractionPhase::Persisting);

        let recorded = if !succeeded {
            debug!("Generation failed, turn not added to history");
            false
        } else {
            match ConversationTurn::new(query, response) {
                Ok(turn) => {
                    if let Err(e) = self.history.append(turn) {
                        warn!(error = %e, "Failed to save conversation history");
                    }
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Reply not added to history");
                    false
                }
            }
        };

        if let Some(path) = &self.snapshot_path {
            if let Err(e) = LastInteraction::new(query, response).save(path) {
                warn!(path = %path.display(), error = %e, "Failed to save last interaction");
            }
        }

        recorded
    }
}
