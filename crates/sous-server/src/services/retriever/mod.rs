//! Retriever Provisioning
//!
//! Resolves a declarative `RetrieverConfig` into a concrete document
//! retriever bound to one of five backend kinds. Every branch injects the
//! same `{user_id, env}` scoped filter and returns the same retrieval
//! call shape, so callers stay backend-agnostic. Missing required
//! environment configuration is a hard failure here, never at first
//! query.

pub mod elastic;
pub mod memory;
pub mod mongo;
pub mod pinecone;

use std::sync::Arc;

use reqwest::Client;

use sous::{
    DocumentRetriever, DomainError, Environment, RetrieverConfig, RetrieverProvider, ScopedFilter,
};

use crate::services::embedding;

pub use elastic::{ElasticAuth, ElasticRetriever};
pub use memory::MemoryRetriever;
pub use mongo::{MongoNamespace, MongoRetriever};
pub use pinecone::PineconeRetriever;

fn require_env(variable: &str) -> Result<String, DomainError> {
    std::env::var(variable)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DomainError::missing_credential(variable))
}

fn env_or(variable: &str, default: &str) -> String {
    std::env::var(variable)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Environment-suffixed index name; environments never share an index.
pub fn scoped_index(base: &str, env: Environment) -> String {
    format!("{}-{}", base, env)
}

/// Constructs retrievers for the active deployment environment
pub struct RetrieverFactory {
    environment: Environment,
    client: Client,
}

impl RetrieverFactory {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            client: Client::new(),
        }
    }

    /// Provision a retriever for one chat turn. The config's user scope is
    /// checked before any backend is touched.
    pub async fn provision(
        &self,
        config: &RetrieverConfig,
    ) -> Result<Arc<dyn DocumentRetriever>, DomainError> {
        config.validate()?;

        let filter = ScopedFilter::new(&config.user_id, self.environment)
            .with_params(&config.search_params);

        match config.provider {
            RetrieverProvider::Elastic => {
                let url = require_env("ELASTICSEARCH_URL")?;
                let api_key = require_env("ELASTICSEARCH_API_KEY")?;
                let index = scoped_index(
                    &env_or("ELASTICSEARCH_INDEX", "sous-recipes"),
                    self.environment,
                );
                Ok(Arc::new(ElasticRetriever::new(
                    self.client.clone(),
                    url,
                    ElasticAuth::ApiKey(api_key),
                    index,
                    filter,
                    embedding::resolve(&config.embedding_model),
                )))
            }
            RetrieverProvider::ElasticLocal => {
                let url = require_env("ELASTICSEARCH_URL")?;
                let password = require_env("ELASTICSEARCH_PASSWORD")?;
                let username = env_or("ELASTICSEARCH_USERNAME", "elastic");
                let index = scoped_index(
                    &env_or("ELASTICSEARCH_INDEX", "sous-recipes"),
                    self.environment,
                );
                Ok(Arc::new(ElasticRetriever::new(
                    self.client.clone(),
                    url,
                    ElasticAuth::Basic { username, password },
                    index,
                    filter,
                    embedding::resolve(&config.embedding_model),
                )))
            }
            RetrieverProvider::Pinecone => {
                let api_key = require_env("PINECONE_API_KEY")?;
                let index = scoped_index(
                    &env_or("PINECONE_INDEX", "sous-recipes"),
                    self.environment,
                );
                let retriever = PineconeRetriever::connect(
                    self.client.clone(),
                    api_key,
                    &index,
                    filter,
                    embedding::resolve(&config.embedding_model),
                )
                .await?;
                Ok(Arc::new(retriever))
            }
            RetrieverProvider::MongoDb => {
                let base_url = require_env("MONGODB_DATA_API_URL")?;
                let api_key = require_env("MONGODB_DATA_API_KEY")?;
                let namespace = MongoNamespace::build(
                    &env_or("MONGODB_NAMESPACE", "sous.recipes"),
                    self.environment,
                    &config.user_id,
                )?;
                Ok(Arc::new(MongoRetriever::new(
                    self.client.clone(),
                    base_url,
                    api_key,
                    namespace,
                    filter,
                    embedding::resolve(&config.embedding_model),
                )))
            }
            RetrieverProvider::Memory => Ok(Arc::new(MemoryRetriever::seeded(filter))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sous::EmbeddingModelSpec;

    fn config(provider: RetrieverProvider, user_id: &str) -> RetrieverConfig {
        RetrieverConfig::new(
            provider,
            user_id,
            "openai/text-embedding-3-small"
                .parse::<EmbeddingModelSpec>()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_missing_user_fails_before_backend_lookup() {
        let factory = RetrieverFactory::new(Environment::Development);
        // Elastic would also need env vars, but the user check comes first.
        let err = factory
            .provision(&config(RetrieverProvider::Elastic, ""))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DomainError::MissingUser));
    }

    #[tokio::test]
    async fn test_memory_backend_needs_no_environment() {
        let factory = RetrieverFactory::new(Environment::Development);
        let retriever = factory
            .provision(&config(RetrieverProvider::Memory, "user-1"))
            .await
            .unwrap();
        assert_eq!(retriever.backend_name(), "memory");
    }

    #[test]
    fn test_scoped_index_is_environment_suffixed() {
        assert_eq!(
            scoped_index("sous-recipes", Environment::Staging),
            "sous-recipes-staging"
        );
        assert_eq!(
            scoped_index("sous-recipes", Environment::Production),
            "sous-recipes-production"
        );
    }
}
