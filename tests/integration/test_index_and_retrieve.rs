use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use docchat::embedding::{Embedder, HashingEmbedder};
use docchat::retrieval::Retriever;
use docchat::services::IndexService;
use docchat::vector_store::VectorStore;
use docchat::DocChatError;

/// Looks texts up in a fixed table; unknown text is an embedding failure
struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, vector)| (text.to_string(), vector.clone()))
                .collect(),
        }
    }
}

impl Embedder for TableEmbedder {
    fn embed(&self, text: &str) -> docchat::Result<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| DocChatError::embedding(format!("no vector for {text:?}")))
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Unit vector whose cosine similarity with (1, 0) is `similarity`
fn with_similarity(similarity: f32) -> Vec<f32> {
    vec![similarity, (1.0 - similarity * similarity).sqrt()]
}

fn write_docs(dir: &Path, docs: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (name, content) in docs {
        fs::write(dir.join(name), content).unwrap();
    }
}

fn index(root: &Path, docs: &Path) -> IndexService {
    let mut service = IndexService::open(root.join("store.bin"), Arc::new(HashingEmbedder::new()))
        .unwrap()
        .with_progress(false);
    service.index_directory(docs).unwrap();
    service
}

#[test]
fn test_top_one_picks_most_similar() {
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "contents of a").unwrap();
    fs::write(&b, "contents of b").unwrap();

    let mut store = VectorStore::new();
    store.insert(a.to_string_lossy(), with_similarity(0.9));
    store.insert(b.to_string_lossy(), with_similarity(0.5));
    let embedder = TableEmbedder::new(&[("query", vec![1.0, 0.0])]);

    let documents = Retriever::new()
        .with_top_k(1)
        .retrieve("query", &store, &embedder)
        .unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].path, a.to_string_lossy());
    assert_eq!(documents[0].preview, "contents of a");

    let ranked = Retriever::new().rank(&[1.0, 0.0], &store);
    assert!((ranked[0].score - 0.9).abs() < 1e-5);
    assert!((ranked[1].score - 0.5).abs() < 1e-5);
}

#[test]
fn test_own_content_ranks_first() {
    let temp = tempfile::tempdir().unwrap();
    let docs = temp.path().join("docs");
    let contents = [
        ("borrow.md", "The borrow checker enforces aliasing rules at compile time."),
        ("async.md", "Futures are polled by an executor such as the tokio runtime."),
        ("macros.md", "Declarative macros match token trees against patterns."),
        ("traits.md", "Traits describe shared behaviour; generics are monomorphized."),
    ];
    write_docs(&docs, &contents);

    let service = index(temp.path(), &docs);
    let embedder = HashingEmbedder::new();

    for (name, content) in contents {
        let documents = Retriever::new()
            .retrieve(content, service.store(), &embedder)
            .unwrap();
        assert_eq!(documents[0].path, docs.join(name).to_string_lossy());
    }
}

#[test]
fn test_results_bounded_sorted_and_deterministic() {
    let temp = tempfile::tempdir().unwrap();
    let docs = temp.path().join("docs");
    write_docs(
        &docs,
        &[
            ("1.txt", "alpha beta gamma"),
            ("2.txt", "beta gamma delta"),
            ("3.txt", "gamma delta epsilon"),
            ("4.txt", "delta epsilon zeta"),
            ("5.txt", "alpha beta gamma"),
        ],
    );
    let service = index(temp.path(), &docs);
    let embedder = HashingEmbedder::new();
    let query = embedder.embed("beta gamma").unwrap();

    let ranked = Retriever::new().rank(&query, service.store());
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    // Identical documents tie and are ordered by path
    let tied: Vec<_> = ranked
        .iter()
        .filter(|s| s.path.ends_with("1.txt") || s.path.ends_with("5.txt"))
        .map(|s| s.path.clone())
        .collect();
    assert!(tied[0].ends_with("1.txt"));

    for top_k in [1, 3, 10] {
        let retriever = Retriever::new().with_top_k(top_k);
        let first = retriever.retrieve("beta gamma", service.store(), &embedder).unwrap();
        let second = retriever.retrieve("beta gamma", service.store(), &embedder).unwrap();

        assert!(first.len() <= top_k);
        assert_eq!(first.len(), top_k.min(5));
        assert_eq!(first, second);
    }
}

#[test]
fn test_reindex_does_not_duplicate() {
    let temp = tempfile::tempdir().unwrap();
    let docs = temp.path().join("docs");
    write_docs(&docs, &[("a.txt", "one"), ("b.txt", "two")]);

    let mut service = index(temp.path(), &docs);
    assert_eq!(service.store().len(), 2);

    service.index_directory(&docs).unwrap();
    service.index_directory(&docs).unwrap();
    assert_eq!(service.store().len(), 2);

    let reloaded = VectorStore::load(&temp.path().join("store.bin")).unwrap();
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_clear_then_retrieve_is_empty() {
    let temp = tempfile::tempdir().unwrap();
    let docs = temp.path().join("docs");
    write_docs(&docs, &[("a.txt", "something to find")]);

    let mut service = index(temp.path(), &docs);
    service.clear().unwrap();

    let documents = Retriever::new()
        .retrieve("something to find", service.store(), &HashingEmbedder::new())
        .unwrap();
    assert!(documents.is_empty());

    let reloaded = VectorStore::load(&temp.path().join("store.bin")).unwrap();
    assert!(Retriever::new()
        .retrieve("anything", &reloaded, &HashingEmbedder::new())
        .unwrap()
        .is_empty());
}

#[test]
fn test_deleted_document_is_skipped_without_backfill() {
    let temp = tempfile::tempdir().unwrap();
    let docs = temp.path().join("docs");
    write_docs(&docs, &[("keep.txt", "kept text"), ("gone.txt", "gone text")]);

    let service = index(temp.path(), &docs);
    fs::remove_file(docs.join("gone.txt")).unwrap();

    let documents = Retriever::new()
        .with_top_k(2)
        .retrieve("text", service.store(), &HashingEmbedder::new())
        .unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].preview, "kept text");
}

#[test]
fn test_corrupt_store_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("store.bin");
    fs::write(&path, b"definitely not bincode").unwrap();

    let err = VectorStore::load(&path).unwrap_err();
    assert!(matches!(err, DocChatError::VectorStore { .. }));
}
