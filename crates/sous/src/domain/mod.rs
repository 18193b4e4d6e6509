//! Domain Layer
//!
//! Pure business entities, value objects, and errors. No I/O here.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{
    AssistantMessage, ChatMessage, ConversationAnalytics, ConversationMessageRecord,
    ConversationRun, MessageRole, RetrieverConfig, RunStatus, TokenUsage,
};
pub use errors::DomainError;
pub use value_objects::{
    CredentialStatus, EmbeddingModelSpec, EmbeddingProvider, Environment, RetrieverProvider,
    ScopedFilter, TimeoutBudget,
};
