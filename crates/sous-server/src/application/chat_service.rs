//! Chat Request Orchestrator
//!
//! Carries one chat turn through validation, configuration, the
//! degraded-mode branch, and the agent invocation, under the gateway tier
//! of the timeout budget. Every path out of here carries a timing
//! measured from request entry, and no error escapes unmapped.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use uuid::Uuid;

use sous::{
    AgentGraph, AssistantMessage, ChatMessage, DomainError, MessageRole, RetrieverConfig,
    TokenUsage,
};

use crate::application::telemetry::ConversationTelemetry;
use crate::config::AppConfig;
use crate::models::ChatRequest;

/// Simulated model latency for degraded-mode mock responses.
const MOCK_LATENCY_MS: u64 = 300;
/// Upper bound on mock response length.
const MOCK_MAX_CHARS: usize = 480;
/// Model tag distinguishing mock replies from real ones.
const MOCK_MODEL_ID: &str = "sous-mock";

/// Rough 4-chars-per-token estimate for telemetry accounting.
const CHARS_PER_TOKEN: usize = 4;
const COST_PER_TOKEN: f64 = 0.000002;

const MOCK_REPLY: &str = "Here's a quick plan to get you started: pick two batch-friendly \
dinners for the week (a bean chili and a sheet-pan salmon both work well), cook doubles so \
lunches take care of themselves, and keep one pantry-only backup meal like pasta with canned \
tomatoes for the night plans fall through. Build the grocery list from those dinners first, \
then fill in breakfasts and snacks.";

/// Success envelope for one turn
#[derive(Debug, Clone)]
pub struct TurnSuccess {
    pub assistant_message: AssistantMessage,
    pub timing_ms: u64,
}

/// Failure envelope for one turn; the timing is still measured from
/// request entry.
#[derive(Debug)]
pub struct TurnFailure {
    pub error: DomainError,
    pub timing_ms: u64,
}

/// Gateway-tier orchestrator for chat turns
pub struct ChatService {
    config: AppConfig,
    agent: Arc<dyn AgentGraph>,
    telemetry: Arc<ConversationTelemetry>,
}

impl ChatService {
    pub fn new(
        config: AppConfig,
        agent: Arc<dyn AgentGraph>,
        telemetry: Arc<ConversationTelemetry>,
    ) -> Self {
        Self {
            config,
            agent,
            telemetry,
        }
    }

    /// Handle one chat turn. This is the single boundary where errors are
    /// caught and mapped; callers always receive a typed outcome with a
    /// timing, never a raw error.
    pub async fn handle_turn(&self, request: ChatRequest) -> Result<TurnSuccess, TurnFailure> {
        let started = Instant::now();
        let mut run_id = None;

        let result = self.run_turn(&request, started, &mut run_id).await;
        let timing_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(assistant_message) => Ok(TurnSuccess {
                assistant_message,
                timing_ms,
            }),
            Err(error) => {
                tracing::error!("Chat turn failed after {}ms: {}", timing_ms, error);
                if let Some(run_id) = run_id {
                    self.telemetry
                        .log_error(run_id, &error.to_string(), json!({ "timing_ms": timing_ms }))
                        .await;
                }
                Err(TurnFailure { error, timing_ms })
            }
        }
    }

    async fn run_turn(
        &self,
        request: &ChatRequest,
        started: Instant,
        run_id_out: &mut Option<Uuid>,
    ) -> Result<AssistantMessage, DomainError> {
        // Validating
        let (conversation_id, messages) = validate(request)?;

        // Configuring: provider and embedding model always come from the
        // environment; the request only contributes its user scope.
        let user_id = request
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.config.default_user_id)
            .to_string();

        let search_params = request
            .client_metadata
            .as_ref()
            .and_then(|m| m.get("search_params"))
            .and_then(|p| p.as_object())
            .cloned()
            .unwrap_or_default();

        let retriever_config = RetrieverConfig::new(
            self.config.retriever_provider,
            user_id.clone(),
            self.config.embedding_model.clone(),
        )
        .with_search_params(search_params);

        let latest_user_message = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        // Telemetry observes the turn but never gates it.
        match self
            .telemetry
            .start(
                &conversation_id,
                Some(user_id),
                json!({ "message": latest_user_message }),
                json!({
                    "environment": self.config.environment.to_string(),
                    "retriever_provider": self.config.retriever_provider.to_string(),
                    "model": self.config.chat_model,
                }),
            )
            .await
        {
            Ok(id) => *run_id_out = Some(id),
            Err(e) => tracing::error!("Telemetry start failed: {}", e),
        }

        if let Some(run_id) = *run_id_out {
            let retry_attempt = request
                .client_metadata
                .as_ref()
                .and_then(|m| m.get("retry_attempt"))
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            let metadata = if retry_attempt > 0 {
                json!({ "retry": true, "retry_attempt": retry_attempt })
            } else {
                json!({})
            };
            let tokens = estimate_tokens(&latest_user_message);
            self.telemetry
                .log_message(
                    run_id,
                    MessageRole::User,
                    &latest_user_message,
                    tokens,
                    None,
                    tokens as f64 * COST_PER_TOKEN,
                    metadata,
                )
                .await;
        }

        // Branch decision: an unusable model credential means degraded mode.
        let assistant_message = if !self.config.model_credential.is_usable() {
            if self.config.environment.is_production() {
                return Err(DomainError::DegradedMode(
                    "model API key is missing or a placeholder; refusing to serve mock \
                     responses in production"
                        .to_string(),
                ));
            }
            self.mock_response().await
        } else {
            // ModelInvoking, bounded by the gateway tier. The agent is not
            // cancelled at the limit; the gateway just stops waiting.
            match tokio::time::timeout(
                self.config.budget.gateway,
                self.agent.invoke(&messages, &retriever_config),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(DomainError::Upstream(
                        "Gateway timed out waiting for the agent".to_string(),
                    ))
                }
            }
        };

        if let Some(run_id) = *run_id_out {
            let response_time_ms = started.elapsed().as_millis() as i64;
            let tokens = if assistant_message.usage.total_tokens > 0 {
                i64::from(assistant_message.usage.total_tokens)
            } else {
                estimate_tokens(&assistant_message.content)
            };
            self.telemetry
                .log_message(
                    run_id,
                    MessageRole::Assistant,
                    &assistant_message.content,
                    tokens,
                    Some(response_time_ms),
                    tokens as f64 * COST_PER_TOKEN,
                    json!({ "model": assistant_message.model }),
                )
                .await;

            // The run spans the whole session; it is finalized only when
            // the client says the conversation is over.
            let metadata = request.client_metadata.as_ref();
            let end_of_conversation = metadata
                .and_then(|m| m.get("end_of_conversation"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if end_of_conversation {
                let satisfaction_score = metadata
                    .and_then(|m| m.get("satisfaction_score"))
                    .and_then(|v| v.as_f64())
                    .map(|v| v as f32);
                self.telemetry
                    .complete_run(
                        run_id,
                        json!({ "content": assistant_message.content }),
                        satisfaction_score,
                    )
                    .await;
            }
        }

        Ok(assistant_message)
    }

    /// Non-production degraded mode: a bounded synthetic reply after a
    /// short simulated latency, tagged so callers can tell it apart.
    async fn mock_response(&self) -> AssistantMessage {
        tracing::warn!(
            "Model credential unavailable in {}; serving mock response",
            self.config.environment
        );
        tokio::time::sleep(std::time::Duration::from_millis(MOCK_LATENCY_MS)).await;

        let mut content = MOCK_REPLY.to_string();
        content.truncate(MOCK_MAX_CHARS);

        let tokens = estimate_tokens(&content) as u32;
        AssistantMessage::new(
            content,
            MOCK_MODEL_ID,
            TokenUsage {
                prompt_tokens: 0,
                completion_tokens: tokens,
                total_tokens: tokens,
            },
        )
    }
}

fn estimate_tokens(text: &str) -> i64 {
    (text.len() / CHARS_PER_TOKEN) as i64
}

/// Validation state: reject incomplete requests before any work happens.
fn validate(request: &ChatRequest) -> Result<(String, Vec<ChatMessage>), DomainError> {
    let conversation_id = request
        .conversation_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DomainError::validation("conversation_id is required"))?
        .to_string();

    let raw_messages = request
        .messages
        .as_ref()
        .ok_or_else(|| DomainError::validation("messages is required"))?;
    if raw_messages.is_empty() {
        return Err(DomainError::validation("messages must not be empty"));
    }

    let mut messages = Vec::with_capacity(raw_messages.len());
    for raw in raw_messages {
        let role: MessageRole = raw
            .role
            .parse()
            .map_err(|_| DomainError::validation(format!("Unrecognized role: {}", raw.role)))?;
        if role == MessageRole::System {
            return Err(DomainError::validation(
                "System messages are not accepted from clients",
            ));
        }
        messages.push(ChatMessage {
            role,
            content: raw.content.clone(),
        });
    }

    Ok((conversation_id, messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomingMessage;
    use async_trait::async_trait;
    use sous::{
        ConversationAnalytics, ConversationMessageRecord, ConversationRun, CredentialStatus,
        EmbeddingModelSpec, Environment, RetrieverProvider, TelemetryRepository, TimeoutBudget,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct NullRepo {
        updated: std::sync::Mutex<Vec<ConversationRun>>,
    }

    #[async_trait]
    impl TelemetryRepository for NullRepo {
        async fn find_active_run(
            &self,
            _session_id: &str,
        ) -> Result<Option<ConversationRun>, DomainError> {
            Ok(None)
        }
        async fn insert_run(&self, _run: &ConversationRun) -> Result<(), DomainError> {
            Ok(())
        }
        async fn update_run(&self, run: &ConversationRun) -> Result<(), DomainError> {
            self.updated.lock().unwrap().push(run.clone());
            Ok(())
        }
        async fn insert_message(
            &self,
            _record: &ConversationMessageRecord,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn insert_analytics(
            &self,
            _analytics: &ConversationAnalytics,
        ) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct CountingAgent {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingAgent {
        fn instant() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl AgentGraph for CountingAgent {
        async fn invoke(
            &self,
            _messages: &[ChatMessage],
            _config: &RetrieverConfig,
        ) -> Result<AssistantMessage, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(AssistantMessage::new(
                "Here's a plan",
                "gpt-4o-mini",
                TokenUsage::default(),
            ))
        }
    }

    fn config(environment: Environment, credential: CredentialStatus) -> AppConfig {
        AppConfig {
            environment,
            bind_address: "127.0.0.1:0".to_string(),
            database_url: "postgres://unused".to_string(),
            retriever_provider: RetrieverProvider::Memory,
            embedding_model: "openai/text-embedding-3-small"
                .parse::<EmbeddingModelSpec>()
                .unwrap(),
            chat_model: "gpt-4o-mini".to_string(),
            chat_api_base: "https://api.openai.com/v1".to_string(),
            model_credential: credential,
            tracing_credential: CredentialStatus::Missing,
            tracing_api_url: String::new(),
            budget: TimeoutBudget::default(),
            default_user_id: "local-user".to_string(),
        }
    }

    fn service(config: AppConfig, agent: Arc<CountingAgent>) -> ChatService {
        let telemetry = Arc::new(ConversationTelemetry::new(
            None,
            Arc::new(NullRepo::default()),
        ));
        ChatService::new(config, agent, telemetry)
    }

    fn request(messages: Vec<(&str, &str)>) -> ChatRequest {
        ChatRequest {
            conversation_id: Some("conv-1".to_string()),
            user_id: Some("user-1".to_string()),
            messages: Some(
                messages
                    .into_iter()
                    .map(|(role, content)| IncomingMessage {
                        role: role.to_string(),
                        content: content.to_string(),
                    })
                    .collect(),
            ),
            client_metadata: None,
        }
    }

    #[tokio::test]
    async fn test_valid_turn_invokes_agent_once() {
        let agent = Arc::new(CountingAgent::instant());
        let svc = service(
            config(
                Environment::Development,
                CredentialStatus::Present("sk-proj-aaaaaaaaaaaaaaaaaaaaaaaa".to_string()),
            ),
            agent.clone(),
        );

        let success = svc
            .handle_turn(request(vec![("user", "plan my week")]))
            .await
            .unwrap();
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
        assert_eq!(success.assistant_message.content, "Here's a plan");
    }

    #[tokio::test]
    async fn test_missing_conversation_id_is_client_error() {
        let agent = Arc::new(CountingAgent::instant());
        let svc = service(
            config(Environment::Development, CredentialStatus::Missing),
            agent,
        );

        let mut req = request(vec![("user", "hi")]);
        req.conversation_id = None;
        let failure = svc.handle_turn(req).await.unwrap_err();
        assert!(matches!(failure.error, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_messages_is_client_error() {
        let agent = Arc::new(CountingAgent::instant());
        let svc = service(
            config(Environment::Development, CredentialStatus::Missing),
            agent,
        );

        let mut req = request(vec![]);
        req.messages = Some(vec![]);
        let failure = svc.handle_turn(req).await.unwrap_err();
        assert!(matches!(failure.error, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unrecognized_role_is_client_error() {
        let agent = Arc::new(CountingAgent::instant());
        let svc = service(
            config(Environment::Development, CredentialStatus::Missing),
            agent,
        );

        let failure = svc
            .handle_turn(request(vec![("tool", "ping")]))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_production_degraded_mode_fails_without_model_call() {
        let agent = Arc::new(CountingAgent::instant());
        let svc = service(
            config(Environment::Production, CredentialStatus::Placeholder),
            agent.clone(),
        );

        let failure = svc
            .handle_turn(request(vec![("user", "plan my week")]))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, DomainError::DegradedMode(_)));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_production_degraded_mode_serves_tagged_mock() {
        let agent = Arc::new(CountingAgent::instant());
        let svc = service(
            config(Environment::Development, CredentialStatus::Missing),
            agent.clone(),
        );

        let success = svc
            .handle_turn(request(vec![("user", "plan my week")]))
            .await
            .unwrap();
        assert_eq!(success.assistant_message.model, MOCK_MODEL_ID);
        assert!(!success.assistant_message.content.is_empty());
        assert!(success.assistant_message.content.len() <= MOCK_MAX_CHARS);
        assert!(success.timing_ms >= MOCK_LATENCY_MS);
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_completes_only_on_end_of_conversation() {
        let agent = Arc::new(CountingAgent::instant());
        let repo = Arc::new(NullRepo::default());
        let telemetry = Arc::new(ConversationTelemetry::new(None, repo.clone()));
        let svc = ChatService::new(
            config(Environment::Development, CredentialStatus::Missing),
            agent,
            telemetry,
        );

        // Mid-conversation turn: the run stays active.
        svc.handle_turn(request(vec![("user", "plan my week")]))
            .await
            .unwrap();
        assert!(repo.updated.lock().unwrap().is_empty());

        // Final turn carries the end flag and a satisfaction score.
        let mut req = request(vec![("user", "thanks, that's everything")]);
        req.client_metadata = Some(json!({
            "end_of_conversation": true,
            "satisfaction_score": 4.5,
        }));
        svc.handle_turn(req).await.unwrap();

        let updated = repo.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, sous::RunStatus::Completed);
        assert_eq!(updated[0].satisfaction_score, Some(4.5));
    }

    #[tokio::test]
    async fn test_gateway_timeout_maps_to_upstream_error() {
        let mut cfg = config(
            Environment::Production,
            CredentialStatus::Present("sk-proj-aaaaaaaaaaaaaaaaaaaaaaaa".to_string()),
        );
        cfg.budget = TimeoutBudget::new(
            Duration::from_millis(10),
            Duration::from_millis(25),
            Duration::from_millis(50),
            2,
            Duration::from_millis(1),
        )
        .unwrap();

        let agent = Arc::new(CountingAgent::slow(Duration::from_millis(200)));
        let svc = service(cfg, agent);

        let failure = svc
            .handle_turn(request(vec![("user", "plan my week")]))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, DomainError::Upstream(_)));
    }
}
