//! Document Retriever Port
//!
//! Every provisioned backend, remote or in-memory, exposes this same
//! retrieval call shape so callers stay backend-agnostic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// A ranked document returned from a retrieval query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Service interface for scoped document retrieval
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Retrieve the `k` documents most relevant to `query`, ranked by
    /// descending score. The provisioned scope filter is always applied.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, DomainError>;

    /// The backend kind serving this retriever (e.g. "elastic", "memory")
    fn backend_name(&self) -> &str;
}
