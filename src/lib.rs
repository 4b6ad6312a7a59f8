pub mod cli;
pub mod config;
pub mod embedding;
pub mod history;
pub mod models;
pub mod retrieval;
pub mod services;
pub mod vector_store;

pub mod env;
pub mod error;
pub mod logging;

pub use error::{DocChatError, Result};
pub use logging::{init_logging, LoggingConfig};
