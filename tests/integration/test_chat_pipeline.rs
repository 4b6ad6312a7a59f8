use async_trait::async_trait;
use futures::StreamExt;
use std::fs;
use std::sync::{Arc, Mutex};

use docchat::config::ResolvedOptions;
use docchat::embedding::{Embedder, HashingEmbedder};
use docchat::history::ConversationHistory;
use docchat::retrieval::Retriever;
use docchat::models::{ContentSegment, LastInteraction, RawResponse};
use docchat::services::{
    ChatSession, Dispatcher, GenerationRequest, IndexService, LlmClient, LlmError, Persona,
    TextStream,
};
use docchat::vector_store::VectorStore;

/// Replies with fixed text blocks, split into small fragments when streaming
struct ScriptedClient {
    blocks: Vec<String>,
    failure: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    fn replying(blocks: &[&str]) -> Self {
        Self {
            blocks: blocks.iter().map(|b| b.to_string()).collect(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            blocks: Vec::new(),
            failure: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    fn record(&self, request: &GenerationRequest) -> Result<(), LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.failure {
            Some(message) => Err(LlmError::RateLimit {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<RawResponse, LlmError> {
        self.record(request)?;

        let mut segments: Vec<ContentSegment> =
            self.blocks.iter().map(ContentSegment::text).collect();
        segments.insert(
            1.min(segments.len()),
            ContentSegment::Other {
                kind: "tool_use".to_string(),
                payload: serde_json::json!({"name": "lookup"}),
            },
        );
        Ok(RawResponse::Segments(segments))
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<TextStream, LlmError> {
        self.record(request)?;

        let mut fragments = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                fragments.push("\n\n".to_string());
            }
            let chars: Vec<char> = block.chars().collect();
            fragments.extend(chars.chunks(3).map(|c| c.iter().collect::<String>()));
        }

        Ok(futures::stream::iter(fragments.into_iter().map(Ok)).boxed())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

fn session(client: Arc<ScriptedClient>, store: VectorStore, history: ConversationHistory) -> ChatSession {
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new());
    ChatSession::new(store, embedder, history, Dispatcher::new(client, Persona::new()))
}

fn streaming() -> ResolvedOptions {
    ResolvedOptions {
        stream: true,
        ..ResolvedOptions::default()
    }
}

#[tokio::test]
async fn test_streaming_and_batched_replies_match() {
    let blocks = ["First paragraph about ownership.", "Second paragraph: borrowing."];

    let batched_client = Arc::new(ScriptedClient::replying(&blocks));
    let mut batched = session(
        batched_client,
        VectorStore::new(),
        ConversationHistory::in_memory(),
    );
    let batched_outcome = batched
        .ask("explain", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();

    let streaming_client = Arc::new(ScriptedClient::replying(&blocks));
    let mut streamed = session(
        streaming_client,
        VectorStore::new(),
        ConversationHistory::in_memory(),
    );
    let mut printed = String::new();
    let streamed_outcome = streamed
        .ask("explain", &streaming(), |fragment| printed.push_str(fragment))
        .await
        .unwrap();

    assert_eq!(
        batched_outcome.response,
        "First paragraph about ownership.\n\nSecond paragraph: borrowing."
    );
    assert_eq!(streamed_outcome.response, batched_outcome.response);
    assert_eq!(printed, streamed_outcome.response);
}

#[tokio::test]
async fn test_empty_store_still_dispatches() {
    let client = Arc::new(ScriptedClient::replying(&["hi there"]));
    let mut chat = session(
        client.clone(),
        VectorStore::new(),
        ConversationHistory::in_memory(),
    );

    let outcome = chat
        .ask("hello", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();

    assert!(outcome.retrieved.is_empty());
    assert_eq!(outcome.response, "hi there");
    let request = client.last_request();
    assert_eq!(
        request.messages.last().unwrap().content,
        "Consider the following context:\n\n\n\nNow, please respond to this query: hello"
    );
}

#[tokio::test]
async fn test_retrieved_documents_reach_the_request() {
    let temp = tempfile::tempdir().unwrap();
    let docs = temp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("tokio.md"), "tokio runtime spawns async tasks").unwrap();
    fs::write(docs.join("serde.md"), "serde derives serialize and deserialize").unwrap();

    let mut index = IndexService::open(
        temp.path().join("store.bin"),
        Arc::new(HashingEmbedder::new()),
    )
    .unwrap()
    .with_progress(false);
    index.index_directory(&docs).unwrap();

    let client = Arc::new(ScriptedClient::replying(&["answer"]));
    let mut chat = session(
        client.clone(),
        index.into_store(),
        ConversationHistory::in_memory(),
    );

    let outcome = chat
        .ask("how does the tokio runtime spawn tasks", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();

    let tokio_path = docs.join("tokio.md").to_string_lossy().into_owned();
    assert_eq!(outcome.retrieved.len(), 2);
    assert_eq!(outcome.retrieved[0].path, tokio_path);
    let request = client.last_request();
    let user_message = &request.messages.last().unwrap().content;
    assert!(user_message.contains(&format!(
        "Content from {tokio_path}:\ntokio runtime spawns async tasks"
    )));
}

#[tokio::test]
async fn test_successful_turn_is_persisted() {
    let temp = tempfile::tempdir().unwrap();
    let history_path = temp.path().join("history.json");
    let snapshot_path = temp.path().join("saved").join("last_interaction.json");

    let client = Arc::new(ScriptedClient::replying(&["persisted reply"]));
    let mut chat = session(
        client,
        VectorStore::new(),
        ConversationHistory::load(&history_path),
    )
    .with_snapshot_path(snapshot_path.clone());

    let outcome = chat
        .ask("remember me", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();

    assert!(outcome.recorded);
    assert!(outcome.remote_error.is_none());

    let reloaded = ConversationHistory::load(&history_path);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.last().unwrap().human, "remember me");
    assert_eq!(reloaded.last().unwrap().assistant, "persisted reply");

    let snapshot = LastInteraction::load(&snapshot_path).unwrap();
    assert_eq!(snapshot.prompt, "remember me");
    assert_eq!(snapshot.response, "persisted reply");
}

#[tokio::test]
async fn test_retriever_settings_shape_the_context() {
    let temp = tempfile::tempdir().unwrap();
    let docs = temp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("tokio.md"), "tokio runtime spawns async tasks").unwrap();
    fs::write(docs.join("serde.md"), "serde derives serialize and deserialize").unwrap();

    let mut index = IndexService::open(
        temp.path().join("store.bin"),
        Arc::new(HashingEmbedder::new()),
    )
    .unwrap()
    .with_progress(false);
    index.index_directory(&docs).unwrap();

    let client = Arc::new(ScriptedClient::replying(&["answer"]));
    let mut chat = session(
        client.clone(),
        index.into_store(),
        ConversationHistory::in_memory(),
    )
    .with_retriever(Retriever::new().with_top_k(1).with_preview_chars(5));

    let outcome = chat
        .ask("how does the tokio runtime spawn tasks", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();

    let tokio_path = docs.join("tokio.md").to_string_lossy().into_owned();
    assert_eq!(outcome.retrieved.len(), 1);
    assert_eq!(outcome.retrieved[0].path, tokio_path);
    assert_eq!(outcome.retrieved[0].preview, "tokio");
}

#[tokio::test]
async fn test_snapshot_write_failure_keeps_the_turn() {
    let temp = tempfile::tempdir().unwrap();
    let history_path = temp.path().join("history.json");
    let blocker = temp.path().join("not-a-dir");
    fs::write(&blocker, "plain file").unwrap();

    let client = Arc::new(ScriptedClient::replying(&["good reply"]));
    let mut chat = session(
        client,
        VectorStore::new(),
        ConversationHistory::load(&history_path),
    )
    .with_snapshot_path(blocker.join("last_interaction.json"));

    let outcome = chat
        .ask("keep this", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.response, "good reply");
    assert!(outcome.recorded);
    assert_eq!(chat.history().len(), 1);
    assert_eq!(ConversationHistory::load(&history_path).len(), 1);
}

#[tokio::test]
async fn test_remote_error_is_reply_but_not_history() {
    let temp = tempfile::tempdir().unwrap();
    let history_path = temp.path().join("history.json");
    let snapshot_path = temp.path().join("saved").join("last_interaction.json");

    for options in [ResolvedOptions::default(), streaming()] {
        let client = Arc::new(ScriptedClient::failing("too many requests"));
        let mut chat = session(
            client,
            VectorStore::new(),
            ConversationHistory::load(&history_path),
        )
        .with_snapshot_path(snapshot_path.clone());

        let outcome = chat.ask("hello", &options, |_| {}).await.unwrap();

        assert_eq!(outcome.response, "Rate limit exceeded: too many requests");
        assert_eq!(outcome.remote_error.as_deref(), Some(outcome.response.as_str()));
        assert!(!outcome.recorded);
        assert!(chat.history().is_empty());

        let snapshot = LastInteraction::load(&snapshot_path).unwrap();
        assert_eq!(snapshot.response, "Rate limit exceeded: too many requests");
    }

    assert!(ConversationHistory::load(&history_path).is_empty());
}

#[tokio::test]
async fn test_empty_reply_is_not_recorded() {
    let client = Arc::new(ScriptedClient::replying(&["   "]));
    let mut chat = session(
        client,
        VectorStore::new(),
        ConversationHistory::in_memory(),
    );

    let outcome = chat
        .ask("say nothing", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();

    assert!(outcome.remote_error.is_none());
    assert!(!outcome.recorded);
    assert!(chat.history().is_empty());
}

#[tokio::test]
async fn test_request_carries_last_five_turns() {
    let client = Arc::new(ScriptedClient::replying(&["ok"]));
    let mut chat = session(
        client.clone(),
        VectorStore::new(),
        ConversationHistory::in_memory(),
    );

    for n in 0..7 {
        chat.ask(&format!("question {n}"), &ResolvedOptions::default(), |_| {})
            .await
            .unwrap();
    }

    // Seven recorded turns when the eighth question goes out
    chat.ask("question 7", &ResolvedOptions::default(), |_| {})
        .await
        .unwrap();
    let request = client.last_request();

    assert_eq!(request.messages.len(), 5 * 2 + 1);
    assert_eq!(request.messages[0].content, "question 2");
    assert_eq!(request.messages[9].content, "ok");
    assert!(request.messages[10].content.ends_with("query: question 7"));
    assert_eq!(chat.history().len(), 8);
}
