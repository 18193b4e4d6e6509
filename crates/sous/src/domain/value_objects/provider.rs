//! RetrieverProvider - Search backend selection
//!
//! The five interchangeable document retrieval backends. Dispatch is an
//! exhaustive match, so adding a backend is a compile-time-checked
//! extension.

use serde::{Deserialize, Serialize};

/// Document retrieval backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RetrieverProvider {
    Elastic,
    ElasticLocal,
    Pinecone,
    MongoDb,
    Memory,
}

impl std::fmt::Display for RetrieverProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrieverProvider::Elastic => write!(f, "elastic"),
            RetrieverProvider::ElasticLocal => write!(f, "elastic-local"),
            RetrieverProvider::Pinecone => write!(f, "pinecone"),
            RetrieverProvider::MongoDb => write!(f, "mongodb"),
            RetrieverProvider::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for RetrieverProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elastic" => Ok(RetrieverProvider::Elastic),
            "elastic-local" => Ok(RetrieverProvider::ElasticLocal),
            "pinecone" => Ok(RetrieverProvider::Pinecone),
            "mongodb" => Ok(RetrieverProvider::MongoDb),
            "memory" => Ok(RetrieverProvider::Memory),
            _ => Err(format!("Unknown retriever provider: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trip() {
        for provider in [
            RetrieverProvider::Elastic,
            RetrieverProvider::ElasticLocal,
            RetrieverProvider::Pinecone,
            RetrieverProvider::MongoDb,
            RetrieverProvider::Memory,
        ] {
            assert_eq!(
                RetrieverProvider::from_str(&provider.to_string()).unwrap(),
                provider
            );
        }
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(RetrieverProvider::from_str("qdrant").is_err());
    }
}
