//! Sous API Client
//!
//! HTTP transport for the chat endpoint. The request timeout is the UI
//! tier of the timeout budget; an elapsed timeout aborts the in-flight
//! request.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One transcript message on the wire
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub role: String,
    pub content: String,
}

/// Request body for one chat turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnRequest {
    pub conversation_id: String,
    pub user_id: String,
    pub messages: Vec<OutgoingMessage>,
    pub client_metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantReply {
    pub content: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnResponse {
    pub assistant_message: AssistantReply,
    pub timing_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: String,
    message: String,
}

/// How one send attempt ended. The retry loop classifies on this, never
/// on raw reqwest errors.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Success(TurnResponse),
    /// 5xx - retryable below the retry ceiling.
    ServerError { status: u16, message: String },
    /// 4xx - terminal, never retried automatically.
    ClientError { status: u16, message: String },
    /// The UI-tier timeout elapsed and the request was aborted.
    TimedOut,
    /// The gateway was unreachable - retryable like a 5xx.
    Unreachable(String),
}

/// Transport seam between the retry loop and the HTTP client
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_turn(&self, request: &TurnRequest) -> SendOutcome;
}

/// API client for Sous
pub struct SousClient {
    client: Client,
    base_url: String,
}

impl SousClient {
    pub fn new(base_url: &str, ui_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(ui_timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Test connection with health check
    pub async fn health(&self) -> anyhow::Result<bool> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }
}

#[async_trait]
impl ChatTransport for SousClient {
    async fn send_turn(&self, request: &TurnRequest) -> SendOutcome {
        let url = format!("{}/api/chat", self.base_url);

        let resp = match self.client.post(&url).json(request).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return SendOutcome::TimedOut,
            Err(e) => return SendOutcome::Unreachable(e.to_string()),
        };

        let status = resp.status();
        if status.is_success() {
            return match resp.json::<TurnResponse>().await {
                Ok(body) => SendOutcome::Success(body),
                Err(e) => SendOutcome::ServerError {
                    status: status.as_u16(),
                    message: format!("Failed to parse response: {}", e),
                },
            };
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => format!("HTTP {}", status),
        };

        if status.is_server_error() {
            SendOutcome::ServerError {
                status: status.as_u16(),
                message,
            }
        } else {
            SendOutcome::ClientError {
                status: status.as_u16(),
                message,
            }
        }
    }
}
