pub mod chat;
pub mod history;
pub mod index;
pub mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

use crate::config::{AppDirectories, Config, OptionOverrides};

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Chat with an LLM about your own documents")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (type 'exit' to end it)
    Chat {
        /// First prompt to send; read interactively when omitted
        prompt: Vec<String>,
        /// Sampling temperature between 0.0 and 1.0 (default: 0.7)
        #[arg(long = "temp")]
        temperature: Option<f32>,
        /// Maximum number of tokens in a reply (default: 1000)
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Role preset from config.toml
        #[arg(short, long)]
        role: Option<String>,
        /// Print the reply as it is generated
        #[arg(short, long)]
        stream: bool,
    },
    /// Index the documents in the context path
    Index,
    /// Remove every indexed document
    ClearIndex,
    /// Forget the conversation history
    ClearHistory,
    /// Set the folder of documents to index
    SetContextPath {
        /// Folder path (a leading ~ is expanded)
        path: String,
    },
    /// Save the most recent reply to a file
    SaveLast {
        /// Output file (default: saved/last_interaction.json)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Directories and configuration shared by every command
pub struct AppContext {
    pub dirs: AppDirectories,
    pub config: Config,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let dirs = AppDirectories::new()?;
        dirs.ensure_directories()
            .context("Failed to prepare docchat directories")?;
        let config = Config::load(&dirs);

        Ok(Self { dirs, config })
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let rt = Runtime::new()?;

        rt.block_on(async {
            match self.command {
                Commands::Chat {
                    prompt,
                    temperature,
                    max_tokens,
                    role,
                    stream,
                } => {
                    let overrides = OptionOverrides {
                        temperature,
                        max_tokens,
                        role,
                        stream,
                    };
                    chat::handle_chat_command(prompt, overrides).await
                }
                Commands::Index => index::handle_index_command().await,
                Commands::ClearIndex => index::handle_clear_index_command().await,
                Commands::ClearHistory => history::handle_clear_history_command().await,
                Commands::SetContextPath { path } => {
                    settings::handle_set_context_path_command(path).await
                }
                Commands::SaveLast { output } => history::handle_save_last_command(output).await,
            }
        })
    }
}
