//! Retriever Configuration
//!
//! The declarative input to retriever provisioning, constructed once per
//! chat turn from environment defaults plus the request's user scope.

use serde_json::Map;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{EmbeddingModelSpec, RetrieverProvider};

/// Declarative configuration resolved into a concrete search backend
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub provider: RetrieverProvider,
    pub user_id: String,
    pub embedding_model: EmbeddingModelSpec,
    /// Caller-supplied search parameters, merged into the scoped filter.
    /// `user_id` and `env` always win over anything in here.
    pub search_params: Map<String, serde_json::Value>,
}

impl RetrieverConfig {
    pub fn new(
        provider: RetrieverProvider,
        user_id: impl Into<String>,
        embedding_model: EmbeddingModelSpec,
    ) -> Self {
        Self {
            provider,
            user_id: user_id.into(),
            embedding_model,
            search_params: Map::new(),
        }
    }

    pub fn with_search_params(mut self, params: Map<String, serde_json::Value>) -> Self {
        self.search_params = params;
        self
    }

    /// A retriever must never be provisioned without a user scope.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_id.trim().is_empty() {
            return Err(DomainError::MissingUser);
        }
        Ok(())
    }
}
