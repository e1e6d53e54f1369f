//! In-memory sink for testing and offline use.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use fiteval_core::error::SinkError;
use fiteval_core::model::EvaluationSummary;
use fiteval_core::traits::{ResultSink, SinkReceipt, TestResultPayload};

/// A sink that keeps everything it receives in memory.
///
/// Can be told to fail its first N calls to exercise retry handling.
pub struct MockSink {
    /// Number of calls that should fail before the sink starts accepting.
    failures: u32,
    /// Status of the simulated failure.
    failure_status: u16,
    call_count: AtomicU32,
    results: Mutex<Vec<TestResultPayload>>,
    summaries: Mutex<Vec<EvaluationSummary>>,
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSink {
    /// A sink that accepts everything.
    pub fn new() -> Self {
        Self::failing(0, 503)
    }

    /// A sink whose first `failures` calls fail with HTTP `status`.
    pub fn failing(failures: u32, status: u16) -> Self {
        Self {
            failures,
            failure_status: status,
            call_count: AtomicU32::new(0),
            results: Mutex::new(Vec::new()),
            summaries: Mutex::new(Vec::new()),
        }
    }

    /// Get the number of calls made to this sink.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Results accepted so far.
    pub fn results(&self) -> Vec<TestResultPayload> {
        self.results.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Summaries accepted so far.
    pub fn summaries(&self) -> Vec<EvaluationSummary> {
        self.summaries.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), SinkError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.failures {
            return Ok(());
        }
        let message = format!("simulated failure {} of {}", n + 1, self.failures);
        Err(match self.failure_status {
            401 | 403 => SinkError::Unauthorized(message),
            400 | 422 => SinkError::Rejected {
                status: self.failure_status,
                message,
            },
            429 => SinkError::RateLimited { retry_after_ms: 10 },
            status => SinkError::Api { status, message },
        })
    }
}

#[async_trait]
impl ResultSink for MockSink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn submit_result(&self, payload: &TestResultPayload) -> anyhow::Result<SinkReceipt> {
        self.check()?;
        if let Ok(mut results) = self.results.lock() {
            results.push(payload.clone());
        }
        Ok(SinkReceipt::ok())
    }

    async fn submit_summary(&self, summary: &EvaluationSummary) -> anyhow::Result<SinkReceipt> {
        self.check()?;
        if let Ok(mut summaries) = self.summaries.lock() {
            summaries.push(summary.clone());
        }
        Ok(SinkReceipt::ok())
    }
}
