use anyhow::{Context, Result};
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use super::AppContext;
use crate::config::{load_work_context, OptionOverrides, ResolvedOptions};
use crate::embedding::{default_embedder, Embedder};
use crate::history::ConversationHistory;
use crate::logging::log_error;
use crate::services::{
    AnthropicClient, AnthropicConfig, ChatSession, Dispatcher, InteractionOutcome, Persona,
};
use crate::vector_store::VectorStore;

pub async fn handle_chat_command(prompt: Vec<String>, overrides: OptionOverrides) -> Result<()> {
    let app = AppContext::load()?;
    let options = ResolvedOptions::resolve(&app.config, &overrides)?;

    let client_config = AnthropicConfig::from_env()?.with_model(app.config.resolve_model());
    let client =
        AnthropicClient::new(client_config).context("Failed to create Anthropic client")?;

    let embedder: Arc<dyn Embedder> = Arc::from(default_embedder(&app.dirs)?);
    let store = VectorStore::load(&app.dirs.vector_store_path())?;
    let history = ConversationHistory::load(&app.dirs.history_path());
    let persona = Persona::new()
        .with_role(options.role_text.clone())
        .with_work_context(load_work_context(&app.dirs.work_context_path()));

    let mut session = ChatSession::new(
        store,
        embedder,
        history,
        Dispatcher::new(Arc::new(client), persona),
    )
    .with_snapshot_path(app.dirs.last_interaction_path());

    println!(
        "{}",
        style("Chat with docchat (type 'exit' to end the conversation)").bold()
    );
    println!("{}", "=".repeat(40));

    let mut pending = (!prompt.is_empty()).then(|| prompt.join(" "));
    loop {
        let query = match pending.take() {
            Some(query) => query,
            None => match read_prompt()? {
                Some(query) => query,
                None => break,
            },
        };

        if query.trim().eq_ignore_ascii_case("exit") {
            println!("Ending conversation. Goodbye!");
            break;
        }
        if query.trim().is_empty() {
            continue;
        }

        if options.stream {
            println!("\n{}", style("Assistant:").bold().cyan());
        }
        let result = session
            .ask(&query, &options, |fragment| {
                print!("{fragment}");
                let _ = io::stdout().flush();
            })
            .await;

        match result {
            Ok(outcome) => print_outcome(&outcome, options.stream),
            Err(e) if e.is_recoverable() => {
                log_error(&e, e.category());
                println!("\n{} {e}", style("Interaction failed:").red());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// `None` once stdin is closed
fn read_prompt() -> Result<Option<String>> {
    print!("\n{} ", style("You:").bold().green());
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        println!();
        return Ok(None);
    }

    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

fn print_outcome(outcome: &InteractionOutcome, streamed: bool) {
    if let Some(error) = &outcome.remote_error {
        if streamed {
            println!();
        }
        println!(
            "\n{} {}",
            style("An error occurred while communicating with the API:").red(),
            error
        );
        return;
    }

    if streamed {
        println!();
    } else {
        println!("\n{}", style("Assistant:").bold().cyan());
        println!("{}", "-".repeat(40));
        println!("{}", outcome.response.trim());
        println!("{}", "-".repeat(40));
    }

    if !outcome.recorded {
        println!("{}", style("(empty reply, not added to history)").dim());
    }
}
