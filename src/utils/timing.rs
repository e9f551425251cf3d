use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

pub const TIMING_TARGET: &str = "emoji.timing";

#[derive(Debug)]
pub struct BatchTimer {
    batch: String,
    total: usize,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    completed: bool,
}

impl BatchTimer {
    pub fn start(batch: &str, total: usize) -> Self {
        let timer = BatchTimer {
            batch: batch.to_string(),
            total,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            completed: false,
        };
        info!(
            target: TIMING_TARGET,
            "event=batch_started batch={} total={} started_at={}",
            timer.batch,
            timer.total,
            timer.started_at.to_rfc3339()
        );
        timer
    }

    pub fn complete(&mut self, succeeded: usize, failed: usize, status: &str) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=batch_completed batch={} total={} succeeded={} failed={} started_at={} completed_at={} duration_s={:.3} status={}",
            self.batch,
            self.total,
            succeeded,
            failed,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            status
        );
    }
}

pub async fn log_llm_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: TIMING_TARGET,
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}
