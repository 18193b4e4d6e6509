//! Telemetry Repository Port (telemetry sink B)
//!
//! Row-oriented persistence for conversation runs, their message records,
//! and the derived analytics summary.

use async_trait::async_trait;

use crate::domain::entities::{ConversationAnalytics, ConversationMessageRecord, ConversationRun};
use crate::domain::errors::DomainError;

/// Data access interface for the relational telemetry sink
#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// The active run for a session, if one exists. At most one run per
    /// session is ever active.
    async fn find_active_run(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationRun>, DomainError>;

    async fn insert_run(&self, run: &ConversationRun) -> Result<(), DomainError>;

    async fn update_run(&self, run: &ConversationRun) -> Result<(), DomainError>;

    async fn insert_message(&self, record: &ConversationMessageRecord)
        -> Result<(), DomainError>;

    async fn insert_analytics(&self, analytics: &ConversationAnalytics)
        -> Result<(), DomainError>;
}
