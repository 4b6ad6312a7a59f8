use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;

/// Outcome of indexing one directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub skipped: usize,
}

/// Owns the vector store and writes it back after every mutation
pub struct IndexService {
    store: VectorStore,
    store_path: PathBuf,
    embedder: Arc<dyn Embedder>,
    show_progress: bool,
}

impl IndexService {
    pub fn new(store: VectorStore, store_path: PathBuf, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            store_path,
            embedder,
            show_progress: console::Term::stderr().is_term(),
        }
    }

    /// Load the store at `store_path`; a missing file starts empty
    pub fn open(store_path: PathBuf, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let store = VectorStore::load(&store_path)?;
        Ok(Self::new(store, store_path, embedder))
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn into_store(self) -> VectorStore {
        self.store
    }

    /// Index every regular file directly inside `dir`.
    ///
    /// The directory is created when missing. Subdirectories are not
    /// descended into. Re-indexing a file overwrites its previous vector.
    pub fn index_directory(&mut self, dir: &Path) -> Result<IndexReport> {
        fs::create_dir_all(dir)?;

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let pb = if self.show_progress {
            let pb = ProgressBar::new(files.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("━━╸"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut report = IndexReport::default();
        for path in &files {
            pb.set_message(
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );

            if self.store.add_file(path, self.embedder.as_ref()) {
                report.indexed += 1;
            } else {
                report.skipped += 1;
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.store.save(&self.store_path)?;
        info!(
            dir = %dir.display(),
            indexed = report.indexed,
            skipped = report.skipped,
            total = self.store.len(),
            dimensions = self.embedder.dimensions(),
            "Indexed files"
        );

        Ok(report)
    }

    /// Drop every indexed document and persist the empty store
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear();
        self.store.save(&self.store_path)?;
        info!("Cleared indexed documents");
        Ok(())
    }
}
