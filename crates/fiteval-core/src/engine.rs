//! Result forwarding engine.
//!
//! Hands a finished evaluation to a [`ResultSink`]: every category result
//! (concurrently, bounded) and then the summary. Transient sink failures are
//! retried with exponential backoff. Nothing here fails the evaluation: the
//! scores are already computed, so delivery problems come back as warnings.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::SinkError;
use crate::model::EvaluationSummary;
use crate::traits::{ResultSink, SinkReceipt, TestResultPayload};

/// Configuration for the forwarder.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Maximum concurrent result submissions.
    pub parallelism: usize,
    /// Retries on transient sink errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each retry up to a minute.
    pub retry_delay: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// What happened when an evaluation was forwarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardReport {
    /// Name of the sink.
    pub sink: String,
    /// Submissions the sink acknowledged.
    pub delivered: usize,
    /// Submissions attempted (results plus the summary).
    pub attempted: usize,
    /// One user-facing line per failed submission.
    pub warnings: Vec<String>,
}

impl ForwardReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Forwards finished evaluations to a sink.
pub struct Forwarder {
    sink: Arc<dyn ResultSink>,
    config: ForwarderConfig,
}

impl Forwarder {
    pub fn new(sink: Arc<dyn ResultSink>, config: ForwarderConfig) -> Self {
        Self { sink, config }
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Forward every result of `summary`, then the summary itself.
    pub async fn forward(&self, summary: &EvaluationSummary) -> ForwardReport {
        let mut report = ForwardReport {
            sink: self.sink.name().to_string(),
            ..Default::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for result in &summary.results {
            let payload = TestResultPayload::from_result(result, summary.participant_id.as_deref());
            let sink = Arc::clone(&self.sink);
            let semaphore = Arc::clone(&semaphore);
            let config = &self.config;

            futures.push(async move {
                let _permit = semaphore.acquire().await;
                let label = format!("{} result", payload.category);
                let outcome = {
                    let sink = &sink;
                    let payload = &payload;
                    with_retry(config, &label, move || sink.submit_result(payload)).await
                };
                (label, outcome)
            });
        }

        while let Some((label, outcome)) = futures.next().await {
            report.attempted += 1;
            match outcome {
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(sink = %report.sink, "{label} not delivered: {e:#}");
                    report.warnings.push(format!("{label} not delivered: {e:#}"));
                }
            }
        }

        report.attempted += 1;
        let sink = &self.sink;
        match with_retry(&self.config, "summary", move || sink.submit_summary(summary)).await {
            Ok(_) => report.delivered += 1,
            Err(e) => {
                tracing::warn!(sink = %report.sink, "summary not delivered: {e:#}");
                report.warnings.push(format!("summary not delivered: {e:#}"));
            }
        }

        tracing::info!(
            sink = %report.sink,
            delivered = report.delivered,
            attempted = report.attempted,
            "evaluation forwarded"
        );
        report
    }
}

/// Run a sink operation, retrying transient failures with exponential
/// backoff. Permanent [`SinkError`]s and explicit refusals return at once.
async fn with_retry<F, Fut>(config: &ForwarderConfig, what: &str, mut op: F) -> Result<SinkReceipt>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SinkReceipt>>,
{
    let mut last_error = None;
    let mut retry_delay = config.retry_delay;
    for retry in 0..=config.max_retries {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
        }
        match op().await {
            Ok(receipt) if receipt.success => return Ok(receipt),
            Ok(receipt) => {
                anyhow::bail!(
                    "sink refused {what}: {}",
                    receipt.message.as_deref().unwrap_or("no reason given")
                );
            }
            Err(e) => {
                if let Some(sink_err) = e.downcast_ref::<SinkError>() {
                    if sink_err.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = sink_err.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms);
                    }
                }
                tracing::debug!(retry, "{what} failed: {e:#}");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, TestResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Fails the first `failures` calls with the error built by `make_err`.
    struct FlakySink {
        failures: u32,
        make_err: fn() -> SinkError,
        calls: AtomicU32,
        received: Mutex<Vec<TestResultPayload>>,
    }

    impl FlakySink {
        fn new(failures: u32, make_err: fn() -> SinkError) -> Self {
            Self {
                failures,
                make_err,
                calls: AtomicU32::new(0),
                received: Mutex::new(Vec::new()),
            }
        }

        fn attempt(&self) -> Result<SinkReceipt> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err((self.make_err)().into())
            } else {
                Ok(SinkReceipt::ok())
            }
        }

        async fn attempt_async(&self) -> Result<SinkReceipt> {
            self.attempt()
        }
    }

    #[async_trait]
    impl ResultSink for FlakySink {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn submit_result(&self, payload: &TestResultPayload) -> Result<SinkReceipt> {
            let receipt = self.attempt()?;
            self.received.lock().unwrap().push(payload.clone());
            Ok(receipt)
        }

        async fn submit_summary(&self, _summary: &EvaluationSummary) -> Result<SinkReceipt> {
            self.attempt()
        }
    }

    fn summary() -> EvaluationSummary {
        let results: Vec<TestResult> = Category::ALL
            .into_iter()
            .zip([80, 60, 70, 90])
            .map(|(c, s)| TestResult::new(c, 1.0, s, Utc::now()))
            .collect();
        EvaluationSummary {
            id: Uuid::new_v4(),
            participant_id: Some("ZS1".into()),
            created_at: Utc::now(),
            strength: 80,
            speed: 60,
            flexibility: 70,
            resistance: 90,
            overall: 75,
            bmi: "22.86".into(),
            bmi_category: None,
            results,
        }
    }

    fn config() -> ForwarderConfig {
        ForwarderConfig {
            parallelism: 2,
            max_retries: 2,
            retry_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_everything() {
        let sink = Arc::new(FlakySink::new(0, || SinkError::Timeout(1)));
        let report = Forwarder::new(sink.clone(), config()).forward(&summary()).await;
        assert!(report.is_clean());
        assert_eq!(report.delivered, 5);
        assert_eq!(report.attempted, 5);
        assert_eq!(report.sink, "flaky");

        let received = sink.received.lock().unwrap();
        assert_eq!(received.len(), 4);
        assert!(received
            .iter()
            .all(|p| p.participant_id.as_deref() == Some("ZS1")));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let sink = Arc::new(FlakySink::new(2, || SinkError::Network("reset".into())));
        let result = with_retry(&config(), "speed result", || sink.attempt_async()).await;
        assert!(result.is_ok());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let sink = Arc::new(FlakySink::new(10, || SinkError::Unauthorized("bad token".into())));
        let err = with_retry(&config(), "summary", || sink.attempt_async())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unauthorized"));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded_and_reported_as_warnings() {
        let sink = Arc::new(FlakySink::new(100, || SinkError::Timeout(30)));
        let report = Forwarder::new(sink.clone(), config()).forward(&summary()).await;
        assert_eq!(report.delivered, 0);
        assert_eq!(report.attempted, 5);
        assert_eq!(report.warnings.len(), 5);
        assert!(report.warnings.iter().any(|w| w.starts_with("summary")));
        // 1 attempt + 2 retries per submission
        assert_eq!(sink.calls.load(Ordering::SeqCst), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_hint_sets_the_delay() {
        let sink = Arc::new(FlakySink::new(1, || SinkError::RateLimited {
            retry_after_ms: 5_000,
        }));
        let start = tokio::time::Instant::now();
        with_retry(&config(), "summary", || sink.attempt_async())
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn refusal_is_not_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&config(), "summary", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Ok::<_, anyhow::Error>(SinkReceipt {
                    success: false,
                    message: Some("duplicate evaluation".into()),
                })
            }
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("duplicate evaluation"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
