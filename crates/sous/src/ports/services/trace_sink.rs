//! Trace Sink Port (telemetry sink A)
//!
//! The primary telemetry sink: an external tracing service that receives
//! run lifecycle events. Failures here propagate from run start; the
//! relational sink (sink B) is the tolerated-failure one.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Payload opening a run on the tracing service
#[derive(Debug, Clone)]
pub struct TraceRunStart {
    pub id: Uuid,
    pub name: String,
    pub inputs: serde_json::Value,
    pub metadata: serde_json::Value,
}

/// Service interface for the tracing sink
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Open a run record.
    async fn start_run(&self, run: &TraceRunStart) -> Result<(), DomainError>;

    /// Close a run with its outputs.
    async fn complete_run(
        &self,
        run_id: Uuid,
        outputs: &serde_json::Value,
    ) -> Result<(), DomainError>;

    /// Close a run with an error.
    async fn error_run(&self, run_id: Uuid, error: &str) -> Result<(), DomainError>;
}
