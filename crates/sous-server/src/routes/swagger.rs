//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{ChatRequest, ChatResponse, ErrorResponse, IncomingMessage};

use sous::domain::entities::chat::{AssistantMessage, ChatMessage, MessageRole, TokenUsage};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::chat::chat_turn,
    ),
    info(
        title = "Sous API",
        version = "0.2.0",
        description = "Sous - meal-planning chat assistant API\n\nOne chat turn per request, carried under a layered timeout budget with degraded-mode fallback.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Chat", description = "Chat - conversation turns through the agent pipeline"),
    ),
    components(
        schemas(
            MessageRole,
            ChatMessage,
            TokenUsage,
            AssistantMessage,
            IncomingMessage,
            ChatRequest,
            ChatResponse,
            ErrorResponse,
        )
    ),
)]
pub struct ApiDoc;
