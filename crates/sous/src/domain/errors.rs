//! Domain Errors
//!
//! Error taxonomy for the conversation pipeline. The gateway maps each
//! variant to an HTTP outcome at its single top-level boundary; the client
//! retry loop only ever retries `Upstream` failures.

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or incomplete request. Never retried automatically.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A retriever was requested without a user scope.
    #[error("user_id is required to provision a retriever")]
    MissingUser,

    /// A chosen backend needs an environment variable that is not set.
    /// Fatal at provisioning time, never deferred to first query.
    #[error("Missing required configuration: {variable}")]
    MissingCredential { variable: String },

    /// Provider name outside the known set.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Production-only: the model credential is absent or a placeholder.
    #[error("Critical configuration error: {0}")]
    DegradedMode(String),

    /// A model or retriever backend call failed or timed out.
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// A telemetry sink failed. Logged by callers, never surfaced on the
    /// primary chat response path.
    #[error("Telemetry sink error: {0}")]
    Telemetry(String),
}

impl DomainError {
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    pub fn missing_credential<T: Into<String>>(variable: T) -> Self {
        Self::MissingCredential {
            variable: variable.into(),
        }
    }

    pub fn upstream<T: std::fmt::Display>(error: T) -> Self {
        Self::Upstream(error.to_string())
    }

    pub fn telemetry<T: std::fmt::Display>(error: T) -> Self {
        Self::Telemetry(error.to_string())
    }

    /// Whether the client tier may re-issue the request after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}
