//! MongoDB Atlas Retriever
//!
//! Vector search through the Atlas Data API. The namespace is computed as
//! `{prefix}_{env}_{user_id}` with the prefix carrying the
//! `database.collection` dot, so per-user, per-environment collections
//! never overlap.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

use sous::{
    DocumentRetriever, DomainError, EmbeddingBackend, Environment, RetrievedDocument, ScopedFilter,
};

/// A `database.collection` pair scoped to one user and environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoNamespace {
    pub database: String,
    pub collection: String,
}

impl MongoNamespace {
    /// Compute the scoped namespace. The prefix must contain the
    /// `database.collection` separator dot.
    pub fn build(prefix: &str, env: Environment, user_id: &str) -> Result<Self, DomainError> {
        let full = format!("{}_{}_{}", prefix, env, user_id);
        let (database, collection) = full.split_once('.').ok_or_else(|| {
            DomainError::validation(format!(
                "MongoDB namespace prefix has no database.collection dot: {}",
                prefix
            ))
        })?;
        Ok(Self {
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }

    /// The full `database.collection` string.
    pub fn full(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }

    /// Recover the environment and user id from a namespace built with
    /// `build` and the same prefix.
    pub fn parse_scope(full: &str, prefix: &str) -> Option<(Environment, String)> {
        let rest = full.strip_prefix(prefix)?.strip_prefix('_')?;
        let (env, user_id) = rest.split_once('_')?;
        Some((Environment::from_str(env).ok()?, user_id.to_string()))
    }
}

/// Document retriever backed by MongoDB Atlas vector search
pub struct MongoRetriever {
    client: Client,
    base_url: String,
    api_key: String,
    namespace: MongoNamespace,
    filter: ScopedFilter,
    embeddings: Arc<dyn EmbeddingBackend>,
}

#[derive(Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    documents: Vec<serde_json::Value>,
}

impl MongoRetriever {
    pub fn new(
        client: Client,
        base_url: String,
        api_key: String,
        namespace: MongoNamespace,
        filter: ScopedFilter,
        embeddings: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            namespace,
            filter,
            embeddings,
        }
    }

    pub fn namespace(&self) -> &MongoNamespace {
        &self.namespace
    }
}

#[async_trait]
impl DocumentRetriever for MongoRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, DomainError> {
        let query_vector = self.embeddings.embed(query).await?;

        let pipeline = json!([
            {
                "$vectorSearch": {
                    "index": "vector_index",
                    "path": "embedding",
                    "queryVector": query_vector,
                    "numCandidates": k * 10,
                    "limit": k,
                    "filter": self.filter.eq_operator_entries()
                }
            },
            {
                "$project": {
                    "_id": 1,
                    "content": 1,
                    "user_id": 1,
                    "env": 1,
                    "score": { "$meta": "vectorSearchScore" }
                }
            }
        ]);

        let body = json!({
            "database": self.namespace.database,
            "collection": self.namespace.collection,
            "pipeline": pipeline
        });

        let url = format!("{}/action/aggregate", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(DomainError::upstream)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Upstream(format!(
                "Atlas aggregate error: {}",
                error_text
            )));
        }

        let result: AggregateResponse = response.json().await.map_err(DomainError::upstream)?;

        Ok(result
            .documents
            .into_iter()
            .map(|doc| RetrievedDocument {
                id: doc
                    .get("_id")
                    .map(|v| v.to_string().trim_matches('"').to_string())
                    .unwrap_or_default(),
                content: doc
                    .get("content")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                score: doc
                    .get("score")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0) as f32,
                metadata: doc,
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "mongodb"
    }
}
