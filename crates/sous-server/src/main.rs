use axum::{routing::get, Json, Router};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod config;
mod models;
mod routes;
mod services;

use adapters::{HttpTraceSink, PgTelemetryRepository};
use application::{ChatService, ConversationTelemetry};
use config::AppConfig;
use services::agent::RetrievalAgent;
use services::model::ChatModelClient;
use services::retriever::RetrieverFactory;
use sous::TraceSink;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Sous API is running - ready to plan some meals".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    tracing::info!("🍳 Sous API initializing...");

    // Timeout budget ordering is validated here; a violation aborts
    // startup rather than surfacing at request time.
    let config = AppConfig::from_env()?;
    tracing::info!(
        "Environment: {} | retriever: {} | embeddings: {}",
        config.environment,
        config.retriever_provider,
        config.embedding_model
    );

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("✅ Database migrations completed");

    // Sink A only exists when the tracing credential looks real; absence
    // disables tracing rather than failing requests.
    let trace_sink: Option<Arc<dyn TraceSink>> = match config.tracing_credential.value() {
        Some(key) => {
            tracing::info!("📡 Trace sink enabled");
            Some(Arc::new(HttpTraceSink::new(
                config.tracing_api_url.clone(),
                key.to_string(),
            )))
        }
        None => {
            tracing::warn!("⚠️  No tracing credential - trace sink disabled");
            None
        }
    };

    let telemetry = Arc::new(ConversationTelemetry::new(
        trace_sink,
        Arc::new(PgTelemetryRepository::new(pool.clone())),
    ));

    if !config.model_credential.is_usable() {
        tracing::warn!(
            "⚠️  Model credential missing or placeholder - degraded mode ({})",
            config.environment
        );
    }

    let agent = Arc::new(RetrievalAgent::new(
        RetrieverFactory::new(config.environment),
        ChatModelClient::new(
            config.chat_api_base.clone(),
            config
                .model_credential
                .value()
                .unwrap_or_default()
                .to_string(),
            config.chat_model.clone(),
            config.budget.agent_processing,
        ),
    ));

    let bind_address = config.bind_address.clone();
    let state = AppState {
        chat_service: Arc::new(ChatService::new(config, agent, telemetry)),
    };

    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(routes::chat::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Sous API ready on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
