//! API Models

pub mod chat;

pub use chat::{ChatRequest, ChatResponse, ErrorResponse, IncomingMessage};
