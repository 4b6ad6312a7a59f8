pub mod anthropic;
pub mod chat_service;
pub mod dispatcher;
pub mod index_service;
pub mod llm;

pub use anthropic::{AnthropicClient, AnthropicConfig, AnthropicError};
pub use chat_service::{ChatSession, InteractionOutcome, InteractionPhase};
pub use dispatcher::{build_user_message, format_context, Dispatched, Dispatcher, Persona};
pub use index_service::{IndexReport, IndexService};
pub use llm::{GenerationRequest, LlmClient, LlmError, TextStream};
