//! Service Ports
//!
//! Interfaces to external collaborators: embedding backends, document
//! retrievers, the agent graph, and the trace sink.

pub mod agent;
pub mod embedding;
pub mod retriever;
pub mod trace_sink;

pub use agent::AgentGraph;
pub use embedding::EmbeddingBackend;
pub use retriever::{DocumentRetriever, RetrievedDocument};
pub use trace_sink::{TraceRunStart, TraceSink};
