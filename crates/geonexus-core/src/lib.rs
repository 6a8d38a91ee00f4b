pub mod chat;
pub mod config;
pub mod error;
pub mod format;
pub mod query;
pub mod response;
pub mod state;

// Re-export main types for convenience
pub use chat::{ChatExchange, PendingQuery, Rendered, QUICK_SUGGESTIONS};
pub use config::Config;
pub use error::QueryError;
pub use format::{format_answer, Block};
pub use query::QueryClient;
pub use response::{parse_response, ParsedResponse};
pub use state::{Conversation, Message, MessageId, Sender};
