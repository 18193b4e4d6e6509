//! Dual-Sink Conversation Telemetry
//!
//! Wraps a conversation run across two independent sinks: the tracing
//! service (sink A, primary — a start failure there propagates) and the
//! relational store (sink B — failures are logged and swallowed). The
//! primary chat response never depends on telemetry succeeding.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use sous::{
    ConversationAnalytics, ConversationMessageRecord, ConversationRun, DomainError, MessageRole,
    TelemetryRepository, TraceRunStart, TraceSink,
};

struct RunAccumulator {
    run: ConversationRun,
    records: Vec<ConversationMessageRecord>,
}

#[derive(Default)]
struct TelemetryState {
    /// session id -> active run id. At most one active run per session.
    sessions: HashMap<String, Uuid>,
    runs: HashMap<Uuid, RunAccumulator>,
}

/// Conversation run recorder over both telemetry sinks
pub struct ConversationTelemetry {
    trace: Option<Arc<dyn TraceSink>>,
    repo: Arc<dyn TelemetryRepository>,
    state: Mutex<TelemetryState>,
}

impl ConversationTelemetry {
    /// `trace` is `None` when the tracing credential is absent; runs then
    /// flow to sink B only.
    pub fn new(trace: Option<Arc<dyn TraceSink>>, repo: Arc<dyn TelemetryRepository>) -> Self {
        Self {
            trace,
            repo,
            state: Mutex::new(TelemetryState::default()),
        }
    }

    /// Open (or reuse) the run for a session. Reuses the active run if the
    /// session already has one; a tracing-sink failure propagates, a
    /// relational-sink failure does not.
    pub async fn start(
        &self,
        session_id: &str,
        user_id: Option<String>,
        inputs: serde_json::Value,
        metadata: serde_json::Value,
    ) -> Result<Uuid, DomainError> {
        let mut state = self.state.lock().await;

        if let Some(run_id) = state.sessions.get(session_id) {
            return Ok(*run_id);
        }

        // The session may have an active run from before a process restart.
        match self.repo.find_active_run(session_id).await {
            Ok(Some(run)) => {
                let run_id = run.id;
                state.sessions.insert(session_id.to_string(), run_id);
                state.runs.insert(
                    run_id,
                    RunAccumulator {
                        run,
                        records: Vec::new(),
                    },
                );
                return Ok(run_id);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Telemetry sink B lookup failed: {}", e);
            }
        }

        let run = ConversationRun::new(session_id, user_id);
        let run_id = run.id;

        if let Some(trace) = &self.trace {
            trace
                .start_run(&TraceRunStart {
                    id: run_id,
                    name: "conversation".to_string(),
                    inputs,
                    metadata,
                })
                .await?;
        }

        if let Err(e) = self.repo.insert_run(&run).await {
            tracing::warn!("Telemetry sink B run insert failed: {}", e);
        }

        state.sessions.insert(session_id.to_string(), run_id);
        state.runs.insert(
            run_id,
            RunAccumulator {
                run,
                records: Vec::new(),
            },
        );

        Ok(run_id)
    }

    /// Append one message record. Persists to sink B only; failures are
    /// logged, never raised.
    pub async fn log_message(
        &self,
        run_id: Uuid,
        role: MessageRole,
        content: &str,
        token_count: i64,
        response_time_ms: Option<i64>,
        cost: f64,
        metadata: serde_json::Value,
    ) {
        let record = {
            let mut state = self.state.lock().await;
            let Some(acc) = state.runs.get_mut(&run_id) else {
                tracing::warn!("log_message for unknown run {}", run_id);
                return;
            };

            let record = ConversationMessageRecord::new(
                run_id,
                role,
                content,
                token_count,
                response_time_ms,
                cost,
            )
            .with_metadata(metadata);

            acc.run.record_message(token_count, cost);
            acc.records.push(record.clone());
            record
        };

        if let Err(e) = self.repo.insert_message(&record).await {
            tracing::warn!("Telemetry sink B message insert failed: {}", e);
        }
    }

    /// Finalize the run as completed, update both sinks, and derive the
    /// analytics summary. Either sink failing is tolerated independently.
    pub async fn complete_run(
        &self,
        run_id: Uuid,
        outputs: serde_json::Value,
        satisfaction_score: Option<f32>,
    ) {
        let Some((mut run, records)) = self.take_run(run_id).await else {
            tracing::warn!("complete_run for unknown run {}", run_id);
            return;
        };

        let response_times: Vec<i64> = records.iter().filter_map(|r| r.response_time_ms).collect();
        let average_response_time = if response_times.is_empty() {
            0.0
        } else {
            response_times.iter().sum::<i64>() as f64 / response_times.len() as f64
        };

        run.complete(average_response_time, satisfaction_score);

        if let Some(trace) = &self.trace {
            if let Err(e) = trace.complete_run(run_id, &outputs).await {
                tracing::warn!("Telemetry sink A completion failed: {}", e);
            }
        }
        if let Err(e) = self.repo.update_run(&run).await {
            tracing::warn!("Telemetry sink B run update failed: {}", e);
        }

        let analytics = ConversationAnalytics::derive(&run, &records);
        if let Err(e) = self.repo.insert_analytics(&analytics).await {
            tracing::warn!("Telemetry sink B analytics insert failed: {}", e);
        }
    }

    /// Finalize the run as errored in both sinks.
    pub async fn log_error(&self, run_id: Uuid, error: &str, context: serde_json::Value) {
        let Some((mut run, _records)) = self.take_run(run_id).await else {
            tracing::warn!("log_error for unknown run {}", run_id);
            return;
        };

        run.fail();

        if let Some(trace) = &self.trace {
            let detail = json!({ "error": error, "context": context }).to_string();
            if let Err(e) = trace.error_run(run_id, &detail).await {
                tracing::warn!("Telemetry sink A error update failed: {}", e);
            }
        }
        if let Err(e) = self.repo.update_run(&run).await {
            tracing::warn!("Telemetry sink B run update failed: {}", e);
        }
    }

    async fn take_run(&self, run_id: Uuid) -> Option<(ConversationRun, Vec<ConversationMessageRecord>)> {
        let mut state = self.state.lock().await;
        let acc = state.runs.remove(&run_id)?;
        state.sessions.retain(|_, id| *id != run_id);
        Some((acc.run, acc.records))
    }
}
