//! Agent Graph Port
//!
//! Abstract interface for the agent that turns a conversation plus a
//! retriever configuration into the next assistant message. The default
//! implementation runs in-process (retrieve, prompt, model call), but the
//! port leaves room for a remote worker adapter.

use async_trait::async_trait;

use crate::domain::entities::{AssistantMessage, ChatMessage, RetrieverConfig};
use crate::domain::errors::DomainError;

/// Interface to the conversation agent
#[async_trait]
pub trait AgentGraph: Send + Sync {
    /// Run one conversation turn. `messages` is the ordered transcript so
    /// far; the returned message is the assistant turn that extends it.
    async fn invoke(
        &self,
        messages: &[ChatMessage],
        config: &RetrieverConfig,
    ) -> Result<AssistantMessage, DomainError>;
}
