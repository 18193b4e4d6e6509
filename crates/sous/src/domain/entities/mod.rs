//! Domain Entities

pub mod chat;
pub mod retriever;
pub mod run;

pub use chat::{AssistantMessage, ChatMessage, MessageRole, TokenUsage};
pub use retriever::RetrieverConfig;
pub use run::{ConversationAnalytics, ConversationMessageRecord, ConversationRun, RunStatus};
