//! Core trait definitions for result sinks.
//!
//! Sinks receive finished results for persistence elsewhere. They are
//! implemented by the `fiteval-sinks` crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Category, EvaluationSummary, TestResult};

/// Trait for collaborators that persist finished results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Human-readable sink name (e.g. "http").
    fn name(&self) -> &str;

    /// Submit one category result.
    async fn submit_result(&self, payload: &TestResultPayload) -> anyhow::Result<SinkReceipt>;

    /// Submit the combined evaluation summary.
    async fn submit_summary(&self, summary: &EvaluationSummary) -> anyhow::Result<SinkReceipt>;
}

/// Wire form of a single test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultPayload {
    /// Participant registration number, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    pub category: Category,
    /// 0–100.
    pub score: u8,
    pub raw_value: f64,
    pub timestamp: DateTime<Utc>,
}

impl TestResultPayload {
    pub fn from_result(result: &TestResult, participant_id: Option<&str>) -> Self {
        Self {
            participant_id: participant_id.map(str::to_string),
            category: result.category(),
            score: result.score(),
            raw_value: result.raw_value(),
            timestamp: result.timestamp(),
        }
    }
}

/// A sink's acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkReceipt {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl SinkReceipt {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}
