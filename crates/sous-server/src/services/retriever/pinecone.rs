//! Pinecone Retriever
//!
//! Resolves the index host through the control plane once at provisioning
//! time, then queries the data plane with the scoped `$eq` filter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use sous::{DocumentRetriever, DomainError, EmbeddingBackend, RetrievedDocument, ScopedFilter};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// Document retriever backed by a Pinecone index
pub struct PineconeRetriever {
    client: Client,
    host: String,
    api_key: String,
    filter: ScopedFilter,
    embeddings: Arc<dyn EmbeddingBackend>,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    score: Option<f32>,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl PineconeRetriever {
    /// Resolve the index handle. A missing or unknown index surfaces here,
    /// at provisioning time.
    pub async fn connect(
        client: Client,
        api_key: String,
        index: &str,
        filter: ScopedFilter,
        embeddings: Arc<dyn EmbeddingBackend>,
    ) -> Result<Self, DomainError> {
        let url = format!("{}/indexes/{}", CONTROL_PLANE_URL, index);
        let response = client
            .get(&url)
            .header("Api-Key", &api_key)
            .send()
            .await
            .map_err(DomainError::upstream)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Upstream(format!(
                "Pinecone index lookup failed for {}: {}",
                index, error_text
            )));
        }

        let description: IndexDescription =
            response.json().await.map_err(DomainError::upstream)?;

        Ok(Self {
            client,
            host: description.host,
            api_key,
            filter,
            embeddings,
        })
    }
}

#[async_trait]
impl DocumentRetriever for PineconeRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, DomainError> {
        let query_vector = self.embeddings.embed(query).await?;

        let body = json!({
            "vector": query_vector,
            "topK": k,
            "filter": self.filter.eq_operator_entries(),
            "includeMetadata": true
        });

        let url = format!("https://{}/query", self.host.trim_start_matches("https://"));
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(DomainError::upstream)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Upstream(format!(
                "Pinecone query error: {}",
                error_text
            )));
        }

        let result: QueryResponse = response.json().await.map_err(DomainError::upstream)?;

        Ok(result
            .matches
            .into_iter()
            .map(|m| {
                let content = m
                    .metadata
                    .get("content")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                RetrievedDocument {
                    id: m.id,
                    content,
                    score: m.score.unwrap_or(0.0),
                    metadata: m.metadata,
                }
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "pinecone"
    }
}
