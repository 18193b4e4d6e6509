//! Chat Model Client
//!
//! OpenAI-style chat completions over reqwest. The client-level timeout
//! is the agent-processing tier of the budget: the model call gives up
//! before the gateway stops waiting on the agent.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use sous::{AssistantMessage, ChatMessage, DomainError, TokenUsage};

/// Client for the upstream chat completion API
pub struct ChatModelClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    model: String,
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<UsagePayload>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsagePayload {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl ChatModelClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        agent_processing_timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(agent_processing_timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Generate the next assistant turn for a conversation.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> Result<AssistantMessage, DomainError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::Upstream("Model call exceeded the agent processing budget".into())
                } else {
                    DomainError::upstream(e)
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Upstream(format!(
                "Chat completion error: {}",
                error_text
            )));
        }

        let completion: CompletionResponse =
            response.json().await.map_err(DomainError::upstream)?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Upstream("Model returned no choices".to_string()))?;

        let usage = completion
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(AssistantMessage::new(content, completion.model, usage))
    }
}
