//! OpenAI Embedding Backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sous::{DomainError, EmbeddingBackend};

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Embedding backend for OpenAI models
pub struct OpenAiEmbedding {
    client: Client,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedding {
    pub fn new(model: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            model,
            api_key,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DomainError::missing_credential("OPENAI_API_KEY"))?;

        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
        };

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(DomainError::upstream)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Upstream(format!(
                "OpenAI embeddings error: {}",
                error_text
            )));
        }

        let embedding_response: EmbeddingResponse =
            response.json().await.map_err(DomainError::upstream)?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| DomainError::Upstream("No embedding returned".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
