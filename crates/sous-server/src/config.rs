//! Server Configuration
//!
//! Everything environment-driven is resolved here, once, at startup:
//! provider selection, the embedding model spec, credential statuses, and
//! the validated timeout budget. Request handling consumes these by value
//! and never re-reads the environment for branching decisions.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use sous::domain::value_objects::timeout_budget as budget_defaults;
use sous::{CredentialStatus, EmbeddingModelSpec, Environment, RetrieverProvider, TimeoutBudget};

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_address: String,
    pub database_url: String,
    /// Backend family serving document retrieval. Always environment
    /// driven; callers cannot select a provider per request.
    pub retriever_provider: RetrieverProvider,
    pub embedding_model: EmbeddingModelSpec,
    pub chat_model: String,
    pub chat_api_base: String,
    /// Status of the model credential. `Missing`/`Placeholder` puts the
    /// orchestrator into degraded mode.
    pub model_credential: CredentialStatus,
    /// Status of the tracing-service credential. Anything but `Present`
    /// silently disables the trace sink.
    pub tracing_credential: CredentialStatus,
    pub tracing_api_url: String,
    /// Validated, environment-scaled timeout budget.
    pub budget: TimeoutBudget,
    /// The single application user; requests may override per turn.
    pub default_user_id: String,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_duration_ms(name: &str, default: Duration) -> Result<Duration> {
    match env_opt(name) {
        Some(raw) => {
            let ms: u64 = raw
                .parse()
                .with_context(|| format!("{} must be an integer millisecond value", name))?;
            Ok(Duration::from_millis(ms))
        }
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load and validate configuration from the process environment.
    /// A timeout budget that violates the tier ordering is fatal here,
    /// before the server binds.
    pub fn from_env() -> Result<Self> {
        let environment = match env_opt("SOUS_ENV") {
            Some(raw) => match Environment::from_str(&raw) {
                Ok(env) => env,
                Err(e) => bail!("SOUS_ENV: {}", e),
            },
            None => Environment::default(),
        };

        let retriever_provider = match env_opt("RETRIEVER_PROVIDER") {
            Some(raw) => match RetrieverProvider::from_str(&raw) {
                Ok(provider) => provider,
                Err(e) => bail!("RETRIEVER_PROVIDER: {}", e),
            },
            None => RetrieverProvider::Memory,
        };

        let embedding_model = env_opt("EMBEDDING_MODEL")
            .unwrap_or_else(|| "openai/text-embedding-3-small".to_string())
            .parse::<EmbeddingModelSpec>()
            .context("EMBEDDING_MODEL")?;

        let base_budget = TimeoutBudget::new(
            env_duration_ms(
                "SOUS_TIMEOUT_AGENT_MS",
                budget_defaults::DEFAULT_AGENT_PROCESSING,
            )?,
            env_duration_ms("SOUS_TIMEOUT_GATEWAY_MS", budget_defaults::DEFAULT_GATEWAY)?,
            env_duration_ms("SOUS_TIMEOUT_UI_MS", budget_defaults::DEFAULT_UI)?,
            match env_opt("SOUS_RETRY_ATTEMPTS") {
                Some(raw) => raw.parse().context("SOUS_RETRY_ATTEMPTS")?,
                None => budget_defaults::DEFAULT_RETRY_ATTEMPTS,
            },
            env_duration_ms(
                "SOUS_RETRY_DELAY_MS",
                budget_defaults::DEFAULT_RETRY_DELAY_BASE,
            )?,
        )
        .map_err(|e| anyhow::anyhow!(e))?;
        let budget = base_budget
            .scaled_for(environment)
            .map_err(|e| anyhow::anyhow!(e))?;

        Ok(Self {
            environment,
            bind_address: env_opt("SOUS_BIND").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            database_url: env_opt("DATABASE_URL")
                .context("DATABASE_URL is required for the telemetry sink")?,
            retriever_provider,
            embedding_model,
            chat_model: env_opt("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            chat_api_base: env_opt("CHAT_API_BASE")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model_credential: CredentialStatus::resolve(env_opt("OPENAI_API_KEY").as_deref()),
            tracing_credential: CredentialStatus::resolve(
                env_opt("LANGSMITH_API_KEY").as_deref(),
            ),
            tracing_api_url: env_opt("LANGSMITH_API_URL")
                .unwrap_or_else(|| "https://api.smith.langchain.com".to_string()),
            budget,
            default_user_id: env_opt("DEFAULT_USER_ID").unwrap_or_else(|| "local-user".to_string()),
        })
    }
}
