//! Embedding Backend Port
//!
//! Abstract interface for text embedding generation. Constructing a
//! backend makes no network call; a missing API key only surfaces once
//! the backend is actually used.

use async_trait::async_trait;

use crate::domain::errors::DomainError;

/// Service interface for generating text embeddings
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate an embedding vector for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Generate embeddings for multiple texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// The model this backend embeds with
    fn model_id(&self) -> &str;
}
