use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

use super::AppContext;
use crate::config::expand_home;
use crate::history::ConversationHistory;
use crate::models::LastInteraction;

pub async fn handle_clear_history_command() -> Result<()> {
    let app = AppContext::load()?;
    let mut history = ConversationHistory::load(&app.dirs.history_path());
    history.clear()?;

    println!("{} Cleared conversation history.", style("✓").green());
    Ok(())
}

pub async fn handle_save_last_command(output: Option<String>) -> Result<()> {
    let app = AppContext::load()?;
    let history = ConversationHistory::load(&app.dirs.history_path());

    let Some(turn) = history.last() else {
        println!("{}", style("No interactions found.").yellow());
        return Ok(());
    };

    let path: PathBuf = output
        .as_deref()
        .map(expand_home)
        .unwrap_or_else(|| app.dirs.last_interaction_path());

    LastInteraction::new(turn.human.clone(), turn.assistant.clone())
        .save(&path)
        .with_context(|| format!("Failed to save last interaction to {}", path.display()))?;

    println!(
        "{} Saved last interaction to {}",
        style("✓").green(),
        style(path.display()).cyan()
    );
    Ok(())
}
