//! PostgreSQL Adapters

pub mod telemetry_repository;

pub use telemetry_repository::PgTelemetryRepository;
