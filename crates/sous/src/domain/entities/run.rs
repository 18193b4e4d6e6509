//! Conversation Run Entities
//!
//! A run is one logged conversation session from first message to
//! completion or error. Runs own their message records; analytics are a
//! write-once summary derived at completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::chat::MessageRole;

/// Lifecycle status of a conversation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Active,
    Completed,
    Error,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Active => write!(f, "active"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(RunStatus::Active),
            "completed" => Ok(RunStatus::Completed),
            "error" => Ok(RunStatus::Error),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// One logged conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRun {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: Option<String>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_messages: i32,
    pub total_tokens: i64,
    pub total_cost: f64,
    /// Mean assistant response time in milliseconds over the run.
    pub average_response_time: f64,
    pub satisfaction_score: Option<f32>,
}

impl ConversationRun {
    pub fn new(session_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            user_id,
            status: RunStatus::Active,
            started_at: Utc::now(),
            completed_at: None,
            total_messages: 0,
            total_tokens: 0,
            total_cost: 0.0,
            average_response_time: 0.0,
            satisfaction_score: None,
        }
    }

    /// Fold one logged message into the run totals.
    pub fn record_message(&mut self, token_count: i64, cost: f64) {
        self.total_messages += 1;
        self.total_tokens += token_count;
        self.total_cost += cost;
    }

    /// Finalize the run as completed. Runs are finalized exactly once.
    pub fn complete(&mut self, average_response_time: f64, satisfaction_score: Option<f32>) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.average_response_time = average_response_time;
        self.satisfaction_score = satisfaction_score;
    }

    /// Finalize the run as errored.
    pub fn fail(&mut self) {
        self.status = RunStatus::Error;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_active(&self) -> bool {
        self.status == RunStatus::Active
    }
}

/// Append-only record of a single message within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessageRecord {
    pub id: Uuid,
    pub run_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub token_count: i64,
    pub response_time_ms: Option<i64>,
    pub cost: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ConversationMessageRecord {
    pub fn new(
        run_id: Uuid,
        role: MessageRole,
        content: impl Into<String>,
        token_count: i64,
        response_time_ms: Option<i64>,
        cost: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            role,
            content: content.into(),
            token_count,
            response_time_ms,
            cost,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    fn metadata_flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Write-once quality/engagement summary for a completed run.
///
/// All scores are bounded 0-100 heuristics over message counts, response
/// times, and token totals. They are engagement proxies, not exact
/// quality measures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationAnalytics {
    pub run_id: Uuid,
    pub completion_rate: f64,
    pub engagement_score: f64,
    pub quality_score: f64,
    pub error_count: i32,
    pub retry_count: i32,
}

impl ConversationAnalytics {
    /// Derive the summary from a run's accumulated message records.
    pub fn derive(run: &ConversationRun, records: &[ConversationMessageRecord]) -> Self {
        let user_messages = records
            .iter()
            .filter(|r| r.role == MessageRole::User)
            .count() as f64;
        let assistant_messages = records
            .iter()
            .filter(|r| r.role == MessageRole::Assistant)
            .count() as f64;

        // Every user turn that received an assistant reply counts as completed.
        let completion_rate = if user_messages == 0.0 {
            0.0
        } else {
            (assistant_messages / user_messages * 100.0).clamp(0.0, 100.0)
        };

        // More user turns and faster replies read as higher engagement.
        let response_times: Vec<i64> = records
            .iter()
            .filter_map(|r| r.response_time_ms)
            .collect();
        let avg_response_ms = if response_times.is_empty() {
            0.0
        } else {
            response_times.iter().sum::<i64>() as f64 / response_times.len() as f64
        };
        let depth_component = (user_messages * 10.0).min(60.0);
        let speed_component = 40.0 * (1.0 - (avg_response_ms.min(10_000.0) / 10_000.0));
        let engagement_score = (depth_component + speed_component).clamp(0.0, 100.0);

        // Longer conversations that spend fewer tokens per message score higher.
        let total_messages = records.len() as f64;
        let tokens_per_message = if total_messages == 0.0 {
            0.0
        } else {
            records.iter().map(|r| r.token_count).sum::<i64>() as f64 / total_messages
        };
        let length_component = (total_messages * 5.0).min(50.0);
        let efficiency_component = 50.0 * (1.0 - (tokens_per_message.min(2_000.0) / 2_000.0));
        let quality_score = (length_component + efficiency_component).clamp(0.0, 100.0);

        let error_count = records.iter().filter(|r| r.metadata_flag("error")).count() as i32;
        let retry_count = records.iter().filter(|r| r.metadata_flag("retry")).count() as i32;

        Self {
            run_id: run.id,
            completion_rate,
            engagement_score,
            quality_score,
            error_count,
            retry_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        run_id: Uuid,
        role: MessageRole,
        tokens: i64,
        response_ms: Option<i64>,
    ) -> ConversationMessageRecord {
        ConversationMessageRecord::new(run_id, role, "content", tokens, response_ms, 0.001)
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = ConversationRun::new("session-1", Some("user-1".to_string()));
        assert!(run.is_active());

        run.record_message(10, 0.001);
        run.record_message(42, 0.002);
        assert_eq!(run.total_messages, 2);
        assert_eq!(run.total_tokens, 52);

        run.complete(120.0, Some(4.5));
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.completed_at.is_some());
        assert!(!run.is_active());
    }

    #[test]
    fn test_failed_run_is_finalized() {
        let mut run = ConversationRun::new("session-1", None);
        run.fail();
        assert_eq!(run.status, RunStatus::Error);
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn test_scores_are_bounded() {
        let run = ConversationRun::new("session-1", None);
        let records: Vec<_> = (0..50)
            .flat_map(|_| {
                vec![
                    record(run.id, MessageRole::User, 100_000, None),
                    record(run.id, MessageRole::Assistant, 100_000, Some(60_000)),
                ]
            })
            .collect();

        let analytics = ConversationAnalytics::derive(&run, &records);
        assert!((0.0..=100.0).contains(&analytics.completion_rate));
        assert!((0.0..=100.0).contains(&analytics.engagement_score));
        assert!((0.0..=100.0).contains(&analytics.quality_score));
    }

    #[test]
    fn test_faster_responses_score_higher_engagement() {
        let run = ConversationRun::new("session-1", None);
        let fast = vec![
            record(run.id, MessageRole::User, 20, None),
            record(run.id, MessageRole::Assistant, 80, Some(200)),
        ];
        let slow = vec![
            record(run.id, MessageRole::User, 20, None),
            record(run.id, MessageRole::Assistant, 80, Some(8_000)),
        ];

        let fast_score = ConversationAnalytics::derive(&run, &fast).engagement_score;
        let slow_score = ConversationAnalytics::derive(&run, &slow).engagement_score;
        assert!(fast_score > slow_score);
    }

    #[test]
    fn test_error_and_retry_counts_from_metadata() {
        let run = ConversationRun::new("session-1", None);
        let records = vec![
            record(run.id, MessageRole::User, 20, None),
            record(run.id, MessageRole::Assistant, 80, Some(100))
                .with_metadata(serde_json::json!({"error": true})),
            record(run.id, MessageRole::User, 20, None)
                .with_metadata(serde_json::json!({"retry": true})),
        ];

        let analytics = ConversationAnalytics::derive(&run, &records);
        assert_eq!(analytics.error_count, 1);
        assert_eq!(analytics.retry_count, 1);
    }
}
