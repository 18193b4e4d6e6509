//! Sous API Routes
//!
//! - /api/chat - one conversation turn through the orchestrator
//! - /health - liveness (mounted in main)
//! - /swagger-ui - OpenAPI documentation

pub mod chat;
pub mod swagger;
