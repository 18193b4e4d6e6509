//! Chat Route - one conversation turn

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};

use sous::DomainError;

use crate::models::{ChatRequest, ChatResponse, ErrorResponse};
use crate::AppState;

fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Upstream(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_code(error: &DomainError) -> &'static str {
    match error {
        DomainError::Validation(_) => "validation_error",
        DomainError::MissingUser => "validation_error",
        DomainError::MissingCredential { .. } => "configuration_error",
        DomainError::UnsupportedProvider(_) => "configuration_error",
        DomainError::DegradedMode(_) => "critical_configuration_error",
        DomainError::Upstream(_) => "upstream_error",
        DomainError::Telemetry(_) => "internal_error",
    }
}

/// Run one chat turn
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 500, description = "Processing failure", body = ErrorResponse),
        (status = 502, description = "Upstream failure, retryable", body = ErrorResponse)
    ),
    tag = "Chat"
)]
pub async fn chat_turn(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> impl IntoResponse {
    match state.chat_service.handle_turn(payload).await {
        Ok(success) => (
            StatusCode::OK,
            Json(ChatResponse {
                assistant_message: success.assistant_message,
                timing_ms: success.timing_ms,
            }),
        )
            .into_response(),
        Err(failure) => {
            let status = status_for(&failure.error);
            // Validation rejections carry no timing; processing failures do.
            let timing_ms =
                (status != StatusCode::BAD_REQUEST).then_some(failure.timing_ms);
            (
                status,
                Json(ErrorResponse {
                    error: error_code(&failure.error).to_string(),
                    message: failure.error.to_string(),
                    timing_ms,
                }),
            )
                .into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat_turn))
}
