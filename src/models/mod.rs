pub mod conversation;
pub mod interaction;
pub mod response;
pub mod retrieval;

pub use conversation::{ChatMessage, ChatRole, ConversationTurn};
pub use interaction::LastInteraction;
pub use response::{normalize, ContentSegment, RawResponse};
pub use retrieval::{RetrievedDocument, ScoredPath};
