//! Ports
//!
//! Abstract interfaces implemented by infrastructure adapters.

pub mod repositories;
pub mod services;

pub use repositories::TelemetryRepository;
pub use services::{
    AgentGraph, DocumentRetriever, EmbeddingBackend, RetrievedDocument, TraceRunStart, TraceSink,
};
