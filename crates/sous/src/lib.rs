//! Sous Domain Library
//!
//! Core domain types and interfaces for the Sous conversation pipeline.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (chat turns, conversation runs)
//!   - `value_objects/`: Immutable value types (providers, filters, budgets)
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Data access interfaces (telemetry sink B)
//!   - `services/`: External service interfaces (embedding, retrieval,
//!     agent graph, trace sink A)
//!
//! # Usage
//!
//! ```rust,ignore
//! use sous::domain::{ChatMessage, RetrieverConfig, TimeoutBudget};
//! use sous::ports::{DocumentRetriever, EmbeddingBackend};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AssistantMessage, ChatMessage, ConversationAnalytics, ConversationMessageRecord,
    ConversationRun, CredentialStatus, DomainError, EmbeddingModelSpec, EmbeddingProvider,
    Environment, MessageRole, RetrieverConfig, RetrieverProvider, RunStatus, ScopedFilter,
    TimeoutBudget, TokenUsage,
};
pub use ports::{
    AgentGraph, DocumentRetriever, EmbeddingBackend, RetrievedDocument, TelemetryRepository,
    TraceRunStart, TraceSink,
};
