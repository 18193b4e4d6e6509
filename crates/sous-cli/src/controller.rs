//! Chat Controller - the client-side retry loop
//!
//! A bounded send loop over the transport: success appends the assistant
//! turn, 5xx-class failures back off exponentially up to the retry
//! ceiling, and everything else is terminal. The staged user message is
//! appended to the transcript exactly once, no matter how many attempts
//! it takes; a terminal failure keeps it staged behind a manual retry
//! affordance.

use serde_json::json;

use sous::TimeoutBudget;

use crate::api::{ChatTransport, OutgoingMessage, SendOutcome, TurnRequest};

/// One visible transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    User(String),
    Assistant { content: String, model: String },
    /// Synthetic error turn, distinguishable from a real assistant reply.
    Error { message: String, timed_out: bool },
}

/// Send loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending,
    Backoff,
    Failed,
    Succeeded,
}

/// A message that failed terminally, kept for manual retry.
#[derive(Debug, Clone)]
struct StagedMessage {
    content: String,
    last_attempt: u32,
}

/// Client-side conversation controller
pub struct ChatController<T: ChatTransport> {
    transport: T,
    budget: TimeoutBudget,
    conversation_id: String,
    user_id: String,
    transcript: Vec<TranscriptEntry>,
    staged: Option<StagedMessage>,
    state: SendState,
    /// Invoked entering each backoff wait, so the UI can surface the
    /// "temporary issue, retrying" state.
    on_backoff: Option<Box<dyn Fn(u32, std::time::Duration) + Send + Sync>>,
}

impl<T: ChatTransport> ChatController<T> {
    pub fn new(
        transport: T,
        budget: TimeoutBudget,
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            budget,
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            transcript: Vec::new(),
            staged: None,
            state: SendState::Idle,
            on_backoff: None,
        }
    }

    pub fn on_backoff(
        mut self,
        callback: impl Fn(u32, std::time::Duration) + Send + Sync + 'static,
    ) -> Self {
        self.on_backoff = Some(Box::new(callback));
        self
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    /// Whether a terminally failed message is staged for manual retry.
    pub fn can_retry(&self) -> bool {
        self.staged.is_some()
    }

    /// Send a new user message. The message joins the transcript once,
    /// here, before the first attempt.
    pub async fn send(&mut self, content: &str) -> SendState {
        self.transcript
            .push(TranscriptEntry::User(content.to_string()));
        self.staged = None;
        self.run_send_loop(content.to_string(), 0).await
    }

    /// Replay the staged content after a terminal failure, resuming the
    /// attempt counter past where it stopped. The user message is already
    /// in the transcript and is not re-added.
    pub async fn retry(&mut self) -> SendState {
        let Some(staged) = self.staged.take() else {
            return self.state;
        };
        self.run_send_loop(staged.content, staged.last_attempt + 1)
            .await
    }

    async fn run_send_loop(&mut self, content: String, start_attempt: u32) -> SendState {
        let mut attempt = start_attempt;

        loop {
            self.state = SendState::Sending;

            let request = self.build_request(attempt);
            match self.transport.send_turn(&request).await {
                SendOutcome::Success(response) => {
                    self.transcript.push(TranscriptEntry::Assistant {
                        content: response.assistant_message.content,
                        model: response.assistant_message.model,
                    });
                    self.staged = None;
                    self.state = SendState::Succeeded;
                    return self.state;
                }
                SendOutcome::ServerError { message, .. }
                | SendOutcome::Unreachable(message) => {
                    if attempt < self.budget.retry_attempts {
                        self.state = SendState::Backoff;
                        let delay = self.budget.backoff_delay(attempt);
                        if let Some(callback) = &self.on_backoff {
                            callback(attempt, delay);
                        }
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return self.fail(content, attempt, message, false);
                }
                SendOutcome::ClientError { message, .. } => {
                    return self.fail(content, attempt, message, false);
                }
                // An abort never auto-retries; it is surfaced as a
                // timeout-specific terminal message.
                SendOutcome::TimedOut => {
                    let message = format!(
                        "No reply within {}s",
                        self.budget.ui.as_secs()
                    );
                    return self.fail(content, attempt, message, true);
                }
            }
        }
    }

    fn fail(
        &mut self,
        content: String,
        attempt: u32,
        message: String,
        timed_out: bool,
    ) -> SendState {
        self.transcript.push(TranscriptEntry::Error {
            message,
            timed_out,
        });
        self.staged = Some(StagedMessage {
            content,
            last_attempt: attempt,
        });
        self.state = SendState::Failed;
        self.state
    }

    fn build_request(&self, attempt: u32) -> TurnRequest {
        // The in-flight message is already the transcript's last user
        // entry (staged once in `send`), so the server sees exactly the
        // conversation the user does, with no duplicates across retries.
        let messages: Vec<OutgoingMessage> = self
            .transcript
            .iter()
            .filter_map(|entry| match entry {
                TranscriptEntry::User(content) => Some(OutgoingMessage {
                    role: "user".to_string(),
                    content: content.clone(),
                }),
                TranscriptEntry::Assistant { content, .. } => Some(OutgoingMessage {
                    role: "assistant".to_string(),
                    content: content.clone(),
                }),
                TranscriptEntry::Error { .. } => None,
            })
            .collect();

        TurnRequest {
            conversation_id: self.conversation_id.clone(),
            user_id: self.user_id.clone(),
            messages,
            client_metadata: json!({ "retry_attempt": attempt }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AssistantReply, TurnResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct ScriptedTransport {
        script: Mutex<Vec<SendOutcome>>,
        calls: Mutex<Vec<(Instant, TurnRequest)>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<SendOutcome>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send_turn(&self, request: &TurnRequest) -> SendOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), request.clone()));
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                server_error()
            } else {
                script.remove(0)
            }
        }
    }

    fn success(content: &str) -> SendOutcome {
        SendOutcome::Success(TurnResponse {
            assistant_message: AssistantReply {
                content: content.to_string(),
                model: "gpt-4o-mini".to_string(),
            },
            timing_ms: 42,
        })
    }

    fn server_error() -> SendOutcome {
        SendOutcome::ServerError {
            status: 500,
            message: "boom".to_string(),
        }
    }

    fn budget() -> TimeoutBudget {
        TimeoutBudget::new(
            std::time::Duration::from_millis(10),
            std::time::Duration::from_millis(20),
            std::time::Duration::from_millis(40),
            2,
            std::time::Duration::from_millis(100),
        )
        .unwrap()
    }

    fn controller(transport: ScriptedTransport) -> ChatController<ScriptedTransport> {
        ChatController::new(transport, budget(), "conv-1", "user-1")
    }

    fn user_entries(controller: &ChatController<ScriptedTransport>) -> usize {
        controller
            .transcript()
            .iter()
            .filter(|e| matches!(e, TranscriptEntry::User(_)))
            .count()
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mut c = controller(ScriptedTransport::new(vec![success("Sure, here's a plan")]));

        let state = c.send("plan my week").await;

        assert_eq!(state, SendState::Succeeded);
        assert_eq!(c.transport.call_count(), 1);
        assert_eq!(c.transcript().len(), 2);
        assert!(!c.can_retry());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_server_errors_then_success() {
        let mut c = controller(ScriptedTransport::new(vec![
            server_error(),
            server_error(),
            success("recovered"),
        ]));

        let state = c.send("plan my week").await;

        assert_eq!(state, SendState::Succeeded);

        // Exactly 3 attempts, backed off 1x then 2x base.
        let calls = c.transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        let gap1 = calls[1].0 - calls[0].0;
        let gap2 = calls[2].0 - calls[1].0;
        assert_eq!(gap1, std::time::Duration::from_millis(100));
        assert_eq!(gap2, std::time::Duration::from_millis(200));
        drop(calls);

        // The user message was displayed exactly once.
        assert_eq!(user_entries(&c), 1);
        assert!(matches!(
            c.transcript().last(),
            Some(TranscriptEntry::Assistant { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_ceiling_yields_single_error_entry() {
        let mut c = controller(ScriptedTransport::new(vec![
            server_error(),
            server_error(),
            server_error(),
        ]));

        let state = c.send("plan my week").await;

        assert_eq!(state, SendState::Failed);
        assert_eq!(c.transport.call_count(), 3);
        assert_eq!(user_entries(&c), 1);

        let errors: Vec<_> = c
            .transcript()
            .iter()
            .filter(|e| matches!(e, TranscriptEntry::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(c.can_retry());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_retry_resumes_counter_without_duplicating_message() {
        let mut c = controller(ScriptedTransport::new(vec![
            server_error(),
            server_error(),
            server_error(),
            success("finally"),
        ]));

        c.send("plan my week").await;
        assert!(c.can_retry());

        let state = c.retry().await;

        assert_eq!(state, SendState::Succeeded);
        assert_eq!(user_entries(&c), 1);
        assert!(!c.can_retry());

        // The manual retry resumed at attempt 3, past the ceiling, so it
        // was a single attempt.
        let calls = c.transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        let retry_attempt = calls[3]
            .1
            .client_metadata
            .get("retry_attempt")
            .and_then(|v| v.as_u64());
        assert_eq!(retry_attempt, Some(3));
    }

    #[tokio::test]
    async fn test_client_error_is_terminal() {
        let mut c = controller(ScriptedTransport::new(vec![SendOutcome::ClientError {
            status: 400,
            message: "conversation_id is required".to_string(),
        }]));

        let state = c.send("plan my week").await;

        assert_eq!(state, SendState::Failed);
        assert_eq!(c.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_does_not_auto_retry() {
        let mut c = controller(ScriptedTransport::new(vec![SendOutcome::TimedOut]));

        let state = c.send("plan my week").await;

        assert_eq!(state, SendState::Failed);
        assert_eq!(c.transport.call_count(), 1);
        assert!(matches!(
            c.transcript().last(),
            Some(TranscriptEntry::Error {
                timed_out: true,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_gateway_is_retryable() {
        let mut c = controller(ScriptedTransport::new(vec![
            SendOutcome::Unreachable("connection refused".to_string()),
            success("back up"),
        ]));

        let state = c.send("plan my week").await;

        assert_eq!(state, SendState::Succeeded);
        assert_eq!(c.transport.call_count(), 2);
    }
}
