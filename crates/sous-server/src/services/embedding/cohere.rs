//! Cohere Embedding Backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sous::{DomainError, EmbeddingBackend};

const EMBED_URL: &str = "https://api.cohere.com/v1/embed";

/// Embedding backend for Cohere models
pub struct CohereEmbedding {
    client: Client,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: Vec<&'a str>,
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl CohereEmbedding {
    pub fn new(model: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            model,
            api_key,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for CohereEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DomainError::missing_credential("COHERE_API_KEY"))?;

        let request = EmbedRequest {
            texts: vec![text],
            model: &self.model,
            input_type: "search_query",
        };

        let response = self
            .client
            .post(EMBED_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(DomainError::upstream)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Upstream(format!(
                "Cohere embed error: {}",
                error_text
            )));
        }

        let embed_response: EmbedResponse =
            response.json().await.map_err(DomainError::upstream)?;

        embed_response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Upstream("No embedding returned".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
