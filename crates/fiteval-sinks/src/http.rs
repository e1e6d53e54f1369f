//! HTTP result sink: posts results and summaries as JSON to a REST API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use fiteval_core::error::SinkError;
use fiteval_core::model::EvaluationSummary;
use fiteval_core::traits::{ResultSink, SinkReceipt, TestResultPayload};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Posts to `{base_url}/evaluations/tests` and `{base_url}/evaluations/summary`.
pub struct HttpSink {
    base_url: String,
    api_token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(base_url: &str, api_token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> anyhow::Result<SinkReceipt> {
        let mut request = self
            .client
            .post(format!("{}{endpoint}", self.base_url))
            .header("content-type", "application/json")
            .json(body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SinkError::Timeout(self.timeout_secs)
            } else {
                SinkError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(SinkError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Unauthorized(body).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            if status == 400 || status == 422 {
                return Err(SinkError::Rejected { status, message }.into());
            }
            return Err(SinkError::Api { status, message }.into());
        }

        // Some deployments answer 201/204 with no body; that is a success.
        let body = response
            .text()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(SinkReceipt::ok());
        }
        let receipt = serde_json::from_str::<SinkReceipt>(&body).map_err(|e| SinkError::Api {
            status,
            message: format!("failed to parse response: {e}"),
        })?;
        Ok(receipt)
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl ResultSink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, payload), fields(category = %payload.category))]
    async fn submit_result(&self, payload: &TestResultPayload) -> anyhow::Result<SinkReceipt> {
        self.post("/evaluations/tests", payload).await
    }

    #[instrument(skip(self, summary), fields(evaluation = %summary.id))]
    async fn submit_summary(&self, summary: &EvaluationSummary) -> anyhow::Result<SinkReceipt> {
        self.post("/evaluations/summary", summary).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fiteval_core::model::{Category, TestResult};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> TestResultPayload {
        let result = TestResult::new(Category::Resistance, 4.0, 70, Utc::now());
        TestResultPayload::from_result(&result, Some("ZS24000001"))
    }

    #[tokio::test]
    async fn successful_submission() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/evaluations/tests"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "participantId": "ZS24000001",
                "category": "resistance",
                "score": 70
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "message": "saved"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sink = HttpSink::new(&server.uri(), Some("test-token".into()), 5).unwrap();
        let receipt = sink.submit_result(&payload()).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.message.as_deref(), Some("saved"));
    }

    #[tokio::test]
    async fn empty_body_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/evaluations/tests"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let sink = HttpSink::new(&format!("{}/", server.uri()), None, 5).unwrap();
        assert_eq!(sink.submit_result(&payload()).await.unwrap(), SinkReceipt::ok());
    }

    #[tokio::test]
    async fn unauthorized_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let sink = HttpSink::new(&server.uri(), Some("nope".into()), 5).unwrap();
        let err = sink.submit_result(&payload()).await.unwrap_err();
        let sink_err = err.downcast_ref::<SinkError>().unwrap();
        assert!(sink_err.is_permanent());
        assert!(err.to_string().contains("unauthorized"));
    }

    #[tokio::test]
    async fn validation_error_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"message": "score out of range"})),
            )
            .mount(&server)
            .await;

        let sink = HttpSink::new(&server.uri(), None, 5).unwrap();
        let err = sink.submit_result(&payload()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SinkError>(),
            Some(SinkError::Rejected { status: 422, message }) if message == "score out of range"
        ));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let sink = HttpSink::new(&server.uri(), None, 5).unwrap();
        let err = sink.submit_result(&payload()).await.unwrap_err();
        let sink_err = err.downcast_ref::<SinkError>().unwrap();
        assert!(!sink_err.is_permanent());
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn rate_limiting() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .mount(&server)
            .await;

        let sink = HttpSink::new(&server.uri(), None, 5).unwrap();
        let err = sink.submit_result(&payload()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SinkError>().and_then(|e| e.retry_after_ms()),
            Some(3000)
        );
    }

    #[tokio::test]
    async fn summary_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/evaluations/summary"))
            .and(body_partial_json(serde_json::json!({"overall": 75, "bmi": "22.86"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let summary = EvaluationSummary {
            id: uuid::Uuid::new_v4(),
            participant_id: None,
            created_at: Utc::now(),
            strength: 80,
            speed: 60,
            flexibility: 70,
            resistance: 90,
            overall: 75,
            bmi: "22.86".into(),
            bmi_category: None,
            results: vec![],
        };
        let sink = HttpSink::new(&server.uri(), None, 5).unwrap();
        assert!(sink.submit_summary(&summary).await.unwrap().success);
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let sink = HttpSink::new("http://127.0.0.1:9", None, 2).unwrap();
        let err = sink.submit_result(&payload()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SinkError>(),
            Some(SinkError::Network(_)) | Some(SinkError::Timeout(_))
        ));
    }
}
