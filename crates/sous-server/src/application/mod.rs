//! Application Services (Use Cases)

pub mod chat_service;
pub mod telemetry;

pub use chat_service::{ChatService, TurnFailure, TurnSuccess};
pub use telemetry::ConversationTelemetry;
