//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod postgres;
pub mod trace;

// Re-exports
pub use postgres::PgTelemetryRepository;
pub use trace::HttpTraceSink;
