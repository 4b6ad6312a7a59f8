use anyhow::Result;
use console::style;
use std::sync::Arc;

use super::AppContext;
use crate::embedding::{default_embedder, Embedder};
use crate::services::IndexService;
use crate::vector_store::VectorStore;

pub async fn handle_index_command() -> Result<()> {
    let app = AppContext::load()?;
    let embedder: Arc<dyn Embedder> = Arc::from(default_embedder(&app.dirs)?);
    let mut service = IndexService::open(app.dirs.vector_store_path(), embedder)?;

    let context_path = &app.config.context_path;
    let report = service.index_directory(context_path)?;

    println!(
        "{} Indexed {} files from: {}",
        style("✓").green(),
        style(report.indexed).green().bold(),
        style(context_path.display()).cyan()
    );
    if report.skipped > 0 {
        println!(
            "  {} files could not be read and were skipped",
            style(report.skipped).yellow()
        );
    }
    println!("  {} documents in the index", service.store().len());

    Ok(())
}

pub async fn handle_clear_index_command() -> Result<()> {
    let app = AppContext::load()?;
    let embedder: Arc<dyn Embedder> = Arc::from(default_embedder(&app.dirs)?);

    // Start from an empty store so a corrupt file can still be cleared
    let mut service = IndexService::new(VectorStore::new(), app.dirs.vector_store_path(), embedder);
    service.clear()?;

    println!("{} Cleared indexed documents.", style("✓").green());
    Ok(())
}
