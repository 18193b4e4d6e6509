//! Elasticsearch Retriever
//!
//! kNN search over an environment-suffixed index. The cloud variant
//! authenticates with an API key; the local variant with basic auth.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use sous::{DocumentRetriever, DomainError, EmbeddingBackend, RetrievedDocument, ScopedFilter};

/// How the Elasticsearch cluster authenticates requests
pub enum ElasticAuth {
    ApiKey(String),
    Basic { username: String, password: String },
}

/// Document retriever backed by an Elasticsearch index
pub struct ElasticRetriever {
    client: Client,
    base_url: String,
    auth: ElasticAuth,
    index: String,
    filter: ScopedFilter,
    embeddings: Arc<dyn EmbeddingBackend>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: serde_json::Value,
}

impl ElasticRetriever {
    pub fn new(
        client: Client,
        base_url: String,
        auth: ElasticAuth,
        index: String,
        filter: ScopedFilter,
        embeddings: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            index,
            filter,
            embeddings,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// The scope filter as a bool query of term clauses.
    fn filter_clauses(&self) -> Vec<serde_json::Value> {
        self.filter
            .entries()
            .into_iter()
            .map(|(field, value)| json!({ "term": { field: value } }))
            .collect()
    }
}

#[async_trait]
impl DocumentRetriever for ElasticRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, DomainError> {
        let query_vector = self.embeddings.embed(query).await?;

        let body = json!({
            "knn": {
                "field": "embedding",
                "query_vector": query_vector,
                "k": k,
                "num_candidates": k * 10,
                "filter": { "bool": { "must": self.filter_clauses() } }
            },
            "size": k,
            "_source": { "excludes": ["embedding"] }
        });

        let url = format!("{}/{}/_search", self.base_url, self.index);
        let mut request = self.client.post(&url).json(&body);
        request = match &self.auth {
            ElasticAuth::ApiKey(key) => request.header("Authorization", format!("ApiKey {}", key)),
            ElasticAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        };

        let response = request.send().await.map_err(DomainError::upstream)?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Upstream(format!(
                "Elasticsearch search error: {}",
                error_text
            )));
        }

        let search: SearchResponse = response.json().await.map_err(DomainError::upstream)?;

        Ok(search
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let content = hit
                    .source
                    .get("content")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                RetrievedDocument {
                    id: hit.id,
                    content,
                    score: hit.score.unwrap_or(0.0),
                    metadata: hit.source,
                }
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "elastic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedding::OpenAiEmbedding;
    use sous::Environment;

    #[test]
    fn test_filter_clauses_carry_scope() {
        let retriever = ElasticRetriever::new(
            Client::new(),
            "http://localhost:9200".to_string(),
            ElasticAuth::Basic {
                username: "elastic".to_string(),
                password: "secret".to_string(),
            },
            "sous-recipes-development".to_string(),
            ScopedFilter::new("user-1", Environment::Development),
            Arc::new(OpenAiEmbedding::new(
                "text-embedding-3-small".to_string(),
                None,
            )),
        );

        let clauses = retriever.filter_clauses();
        assert!(clauses.contains(&json!({ "term": { "user_id": "user-1" } })));
        assert!(clauses.contains(&json!({ "term": { "env": "development" } })));
    }
}
