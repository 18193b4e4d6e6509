//! Embedding Resolver
//!
//! Turns a `"provider/model"` spec into a callable embedding backend.
//! Construction never touches the network; a missing API key only
//! surfaces when the backend is used.

pub mod cohere;
pub mod openai;

use std::sync::Arc;

use sous::{DomainError, EmbeddingBackend, EmbeddingModelSpec, EmbeddingProvider};

pub use cohere::CohereEmbedding;
pub use openai::OpenAiEmbedding;

/// Construct the backend for a parsed embedding model spec.
pub fn resolve(spec: &EmbeddingModelSpec) -> Arc<dyn EmbeddingBackend> {
    match spec.provider {
        EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbedding::new(
            spec.model.clone(),
            std::env::var("OPENAI_API_KEY").ok(),
        )),
        EmbeddingProvider::Cohere => Arc::new(CohereEmbedding::new(
            spec.model.clone(),
            std::env::var("COHERE_API_KEY").ok(),
        )),
    }
}

/// Resolve a raw `"provider/model"` string. Absence of `/` implies
/// OpenAI; a provider outside the known set is an error here, never a
/// silent default.
pub fn resolve_spec(raw: &str) -> Result<Arc<dyn EmbeddingBackend>, DomainError> {
    let spec: EmbeddingModelSpec = raw.parse()?;
    Ok(resolve(&spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_openai() {
        let backend = resolve_spec("text-embedding-3-small").unwrap();
        assert_eq!(backend.model_id(), "text-embedding-3-small");
    }

    #[test]
    fn test_resolve_cohere() {
        let backend = resolve_spec("cohere/embed-english-v3.0").unwrap();
        assert_eq!(backend.model_id(), "embed-english-v3.0");
    }

    #[test]
    fn test_unknown_provider_fails_at_resolve_time() {
        assert!(matches!(
            resolve_spec("voyage/voyage-2"),
            Err(DomainError::UnsupportedProvider(_))
        ));
    }
}
