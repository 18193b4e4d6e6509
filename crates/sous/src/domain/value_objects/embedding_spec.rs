//! EmbeddingModelSpec - "provider/model" selection
//!
//! Parsed by splitting a raw spec string on the first `/`. A spec with no
//! slash is an OpenAI model name; an unknown provider is a
//! construction-time failure, never a silent default.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Embedding backend provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAi,
    Cohere,
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAi => write!(f, "openai"),
            EmbeddingProvider::Cohere => write!(f, "cohere"),
        }
    }
}

/// A parsed "provider/model" embedding selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingModelSpec {
    pub provider: EmbeddingProvider,
    pub model: String,
}

impl EmbeddingModelSpec {
    pub fn new(provider: EmbeddingProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl std::fmt::Display for EmbeddingModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

impl std::str::FromStr for EmbeddingModelSpec {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model) = match s.split_once('/') {
            Some((provider, model)) => (provider, model),
            // No slash: the whole string is an OpenAI model name.
            None => ("openai", s),
        };

        if model.is_empty() {
            return Err(DomainError::validation(format!(
                "Embedding model spec has no model name: {}",
                s
            )));
        }

        let provider = match provider.to_lowercase().as_str() {
            "openai" => EmbeddingProvider::OpenAi,
            "cohere" => EmbeddingProvider::Cohere,
            other => return Err(DomainError::UnsupportedProvider(other.to_string())),
        };

        Ok(Self::new(provider, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_provider() {
        let spec: EmbeddingModelSpec = "cohere/embed-english-v3.0".parse().unwrap();
        assert_eq!(spec.provider, EmbeddingProvider::Cohere);
        assert_eq!(spec.model, "embed-english-v3.0");
    }

    #[test]
    fn test_no_slash_defaults_to_openai() {
        let spec: EmbeddingModelSpec = "text-embedding-3-small".parse().unwrap();
        assert_eq!(spec.provider, EmbeddingProvider::OpenAi);
        assert_eq!(spec.model, "text-embedding-3-small");
    }

    #[test]
    fn test_splits_on_first_slash_only() {
        let spec: EmbeddingModelSpec = "openai/org/model".parse().unwrap();
        assert_eq!(spec.model, "org/model");
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let err = "voyage/voyage-2".parse::<EmbeddingModelSpec>().unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedProvider(_)));
    }
}
