//! Evaluation aggregator.
//!
//! Collects one [`TestResult`] per category into write-once slots and
//! builds the [`EvaluationSummary`] once all four are present.

use chrono::Utc;
use uuid::Uuid;

use crate::body::BodyMetrics;
use crate::error::SessionError;
use crate::model::{Category, EvaluationSummary, TestResult};
use crate::rubric::overall_score;
use crate::session::Completion;

/// One participant's evaluation in progress.
#[derive(Debug, Clone)]
pub struct Evaluation {
    id: Uuid,
    participant_id: Option<String>,
    body: Option<BodyMetrics>,
    slots: [Option<TestResult>; 4],
}

impl Default for Evaluation {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_id: None,
            body: None,
            slots: Default::default(),
        }
    }

    pub fn with_participant(mut self, id: impl Into<String>) -> Self {
        self.participant_id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: BodyMetrics) -> Self {
        self.body = Some(body);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn participant_id(&self) -> Option<&str> {
        self.participant_id.as_deref()
    }

    pub fn body(&self) -> Option<&BodyMetrics> {
        self.body.as_ref()
    }

    /// Store a category result. Each slot can be written once.
    pub fn record(&mut self, result: TestResult) -> Result<(), SessionError> {
        let category = result.category();
        let slot = &mut self.slots[category.index()];
        if slot.is_some() {
            return Err(SessionError::AlreadyScored(category));
        }
        tracing::debug!(evaluation = %self.id, %category, score = result.score(), "result recorded");
        *slot = Some(result);
        Ok(())
    }

    /// Wait for a session to finish and record its result. Returns `false`
    /// if the session was cancelled, leaving the slot empty.
    pub async fn attach(&mut self, completion: Completion) -> Result<bool, SessionError> {
        let expected = completion.category();
        if self.slots[expected.index()].is_some() {
            return Err(SessionError::AlreadyScored(expected));
        }
        match completion.wait().await {
            Some(result) if result.category() != expected => Err(SessionError::WrongCategory {
                expected,
                actual: result.category(),
            }),
            Some(result) => self.record(result).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn result(&self, category: Category) -> Option<&TestResult> {
        self.slots[category.index()].as_ref()
    }

    /// Recorded results in category order.
    pub fn results(&self) -> impl Iterator<Item = &TestResult> {
        self.slots.iter().flatten()
    }

    /// True once every category has a result.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn missing(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.slots[c.index()].is_none())
            .collect()
    }

    /// The finished summary, `None` until all four categories are scored.
    pub fn summary(&self) -> Option<EvaluationSummary> {
        let [strength, speed, flexibility, resistance] = &self.slots;
        let (strength, speed, flexibility, resistance) = (
            strength.as_ref()?,
            speed.as_ref()?,
            flexibility.as_ref()?,
            resistance.as_ref()?,
        );
        let scores = [
            strength.score(),
            speed.score(),
            flexibility.score(),
            resistance.score(),
        ];

        Some(EvaluationSummary {
            id: self.id,
            participant_id: self.participant_id.clone(),
            created_at: Utc::now(),
            strength: scores[0],
            speed: scores[1],
            flexibility: scores[2],
            resistance: scores[3],
            overall: overall_score(&scores),
            bmi: self.body.map(|b| b.bmi_display()).unwrap_or_default(),
            bmi_category: self.body.map(|b| b.bmi_category()),
            results: vec![
                strength.clone(),
                speed.clone(),
                flexibility.clone(),
                resistance.clone(),
            ],
        })
    }
}
