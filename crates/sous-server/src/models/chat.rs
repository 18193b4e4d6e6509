//! Chat Endpoint Models
//!
//! Request fields are optional at the serde layer so an absent field
//! surfaces as a 400 validation error with a named field, not a decode
//! rejection.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use sous::AssistantMessage;

/// One incoming transcript message. The role is validated by the
/// orchestrator; anything outside user/assistant is a client error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

/// Request body for one chat turn
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub messages: Option<Vec<IncomingMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_metadata: Option<serde_json::Value>,
}

/// Successful chat turn
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub assistant_message: AssistantMessage,
    pub timing_ms: u64,
}

/// Error envelope. `timing_ms` is present on processing failures and
/// absent on validation rejections.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<u64>,
}
