//! PostgreSQL implementation of TelemetryRepository (sink B)

use async_trait::async_trait;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use sous::{
    ConversationAnalytics, ConversationMessageRecord, ConversationRun, DomainError, RunStatus,
    TelemetryRepository,
};

/// PostgreSQL implementation of the relational telemetry sink
pub struct PgTelemetryRepository {
    pool: PgPool,
}

impl PgTelemetryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    session_id: String,
    user_id: Option<String>,
    status: String,
    started_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    total_messages: i32,
    total_tokens: i64,
    total_cost: f64,
    average_response_time: f64,
    satisfaction_score: Option<f32>,
}

impl TryFrom<RunRow> for ConversationRun {
    type Error = String;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            user_id: row.user_id,
            status: RunStatus::from_str(&row.status)?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            total_messages: row.total_messages,
            total_tokens: row.total_tokens,
            total_cost: row.total_cost,
            average_response_time: row.average_response_time,
            satisfaction_score: row.satisfaction_score,
        })
    }
}

#[async_trait]
impl TelemetryRepository for PgTelemetryRepository {
    async fn find_active_run(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationRun>, DomainError> {
        let row = sqlx::query_as::<_, RunRow>(
            r#"
            SELECT * FROM conversation_runs
            WHERE session_id = $1 AND status = 'active'
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::telemetry)?;

        row.map(ConversationRun::try_from)
            .transpose()
            .map_err(DomainError::Telemetry)
    }

    async fn insert_run(&self, run: &ConversationRun) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_runs
                (id, session_id, user_id, status, started_at, total_messages,
                 total_tokens, total_cost, average_response_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(run.id)
        .bind(&run.session_id)
        .bind(&run.user_id)
        .bind(run.status.to_string())
        .bind(run.started_at)
        .bind(run.total_messages)
        .bind(run.total_tokens)
        .bind(run.total_cost)
        .bind(run.average_response_time)
        .execute(&self.pool)
        .await
        .map_err(DomainError::telemetry)?;

        Ok(())
    }

    async fn update_run(&self, run: &ConversationRun) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE conversation_runs
            SET status = $2, completed_at = $3, total_messages = $4,
                total_tokens = $5, total_cost = $6, average_response_time = $7,
                satisfaction_score = $8
            WHERE id = $1
            "#,
        )
        .bind(run.id)
        .bind(run.status.to_string())
        .bind(run.completed_at)
        .bind(run.total_messages)
        .bind(run.total_tokens)
        .bind(run.total_cost)
        .bind(run.average_response_time)
        .bind(run.satisfaction_score)
        .execute(&self.pool)
        .await
        .map_err(DomainError::telemetry)?;

        Ok(())
    }

    async fn insert_message(
        &self,
        record: &ConversationMessageRecord,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_messages
                (id, run_id, role, content, token_count, response_time_ms, cost, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.run_id)
        .bind(record.role.to_string())
        .bind(&record.content)
        .bind(record.token_count)
        .bind(record.response_time_ms)
        .bind(record.cost)
        .bind(&record.metadata)
        .execute(&self.pool)
        .await
        .map_err(DomainError::telemetry)?;

        Ok(())
    }

    async fn insert_analytics(
        &self,
        analytics: &ConversationAnalytics,
    ) -> Result<(), DomainError> {
        // Write-once: a second derivation for the same run is a no-op.
        sqlx::query(
            r#"
            INSERT INTO conversation_analytics
                (run_id, completion_rate, engagement_score, quality_score,
                 error_count, retry_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (run_id) DO NOTHING
            "#,
        )
        .bind(analytics.run_id)
        .bind(analytics.completion_rate)
        .bind(analytics.engagement_score)
        .bind(analytics.quality_score)
        .bind(analytics.error_count)
        .bind(analytics.retry_count)
        .execute(&self.pool)
        .await
        .map_err(DomainError::telemetry)?;

        Ok(())
    }
}
