//! Value Objects

pub mod credential;
pub mod embedding_spec;
pub mod environment;
pub mod provider;
pub mod scoped_filter;
pub mod timeout_budget;

pub use credential::CredentialStatus;
pub use embedding_spec::{EmbeddingModelSpec, EmbeddingProvider};
pub use environment::Environment;
pub use provider::RetrieverProvider;
pub use scoped_filter::ScopedFilter;
pub use timeout_budget::TimeoutBudget;
