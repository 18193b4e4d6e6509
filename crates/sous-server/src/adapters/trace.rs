//! HTTP Trace Sink Implementation (sink A)
//!
//! Delivers run lifecycle events to the tracing service using reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use sous::{DomainError, TraceRunStart, TraceSink};

/// HTTP implementation of TraceSink
pub struct HttpTraceSink {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTraceSink {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn patch_run(
        &self,
        run_id: Uuid,
        body: serde_json::Value,
    ) -> Result<(), DomainError> {
        let url = format!("{}/runs/{}", self.base_url, run_id);
        let response = self
            .client
            .patch(&url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(DomainError::telemetry)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Telemetry(format!(
                "Trace run update failed ({}): {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl TraceSink for HttpTraceSink {
    async fn start_run(&self, run: &TraceRunStart) -> Result<(), DomainError> {
        let body = json!({
            "id": run.id,
            "name": run.name,
            "run_type": "chain",
            "inputs": run.inputs,
            "extra": { "metadata": run.metadata },
            "start_time": chrono::Utc::now(),
        });

        let url = format!("{}/runs", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(DomainError::telemetry)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Telemetry(format!(
                "Trace run start failed ({}): {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn complete_run(
        &self,
        run_id: Uuid,
        outputs: &serde_json::Value,
    ) -> Result<(), DomainError> {
        self.patch_run(
            run_id,
            json!({ "outputs": outputs, "end_time": chrono::Utc::now() }),
        )
        .await
    }

    async fn error_run(&self, run_id: Uuid, error: &str) -> Result<(), DomainError> {
        self.patch_run(
            run_id,
            json!({ "error": error, "end_time": chrono::Utc::now() }),
        )
        .await
    }
}
