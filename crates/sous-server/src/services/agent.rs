//! Retrieval Agent
//!
//! The in-process agent graph: provision a scoped retriever for the turn,
//! pull context for the latest user message, build the system prompt, and
//! call the model.

use async_trait::async_trait;

use sous::{
    AgentGraph, AssistantMessage, ChatMessage, DomainError, MessageRole, RetrievedDocument,
    RetrieverConfig,
};

use crate::services::model::ChatModelClient;
use crate::services::retriever::RetrieverFactory;

/// Documents pulled into context per turn.
const RETRIEVAL_TOP_K: usize = 4;

const SYSTEM_PROMPT: &str = "You are Sous, a meal-planning assistant. Help the user plan \
meals, build grocery lists, and adapt recipes to what they have on hand. \
Ground your answers in the provided documents when they are relevant.";

/// Agent graph running retrieval and generation in-process
pub struct RetrievalAgent {
    retrievers: RetrieverFactory,
    model: ChatModelClient,
}

impl RetrievalAgent {
    pub fn new(retrievers: RetrieverFactory, model: ChatModelClient) -> Self {
        Self { retrievers, model }
    }

    fn build_system_prompt(documents: &[RetrievedDocument]) -> String {
        let mut prompt = String::from(SYSTEM_PROMPT);

        if !documents.is_empty() {
            prompt.push_str("\n\n## Relevant documents\n");
            for doc in documents {
                prompt.push_str(&format!("- {}\n", doc.content));
            }
        }

        prompt
    }
}

#[async_trait]
impl AgentGraph for RetrievalAgent {
    async fn invoke(
        &self,
        messages: &[ChatMessage],
        config: &RetrieverConfig,
    ) -> Result<AssistantMessage, DomainError> {
        let retriever = self.retrievers.provision(config).await?;

        let query = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let documents = retriever.search(query, RETRIEVAL_TOP_K).await?;
        tracing::debug!(
            backend = retriever.backend_name(),
            count = documents.len(),
            "Retrieved context documents"
        );

        let mut prompt_messages = Vec::with_capacity(messages.len() + 1);
        prompt_messages.push(ChatMessage::system(Self::build_system_prompt(&documents)));
        prompt_messages.extend(messages.iter().cloned());

        self.model.complete(&prompt_messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_prompt_includes_documents() {
        let docs = vec![RetrievedDocument {
            id: "doc-1".to_string(),
            content: "Batch-cook bean chili for meal prep".to_string(),
            score: 0.9,
            metadata: json!({}),
        }];

        let prompt = RetrievalAgent::build_system_prompt(&docs);
        assert!(prompt.contains("meal-planning assistant"));
        assert!(prompt.contains("Batch-cook bean chili"));
    }

    #[test]
    fn test_system_prompt_without_documents() {
        let prompt = RetrievalAgent::build_system_prompt(&[]);
        assert!(!prompt.contains("Relevant documents"));
    }
}
