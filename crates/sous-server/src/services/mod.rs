//! Provider Services
//!
//! Clients for the external collaborators: embedding backends, document
//! retrieval backends, and the chat model, plus the in-process agent
//! graph that ties them together.

pub mod agent;
pub mod embedding;
pub mod model;
pub mod retriever;
