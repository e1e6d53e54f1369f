//! Evaluation sheets: measurements recorded on paper (or by another tool)
//! replayed through the same session controllers the live flow uses.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::body::BodyMetrics;
use crate::catalog::Catalog;
use crate::error::BodyError;
use crate::model::{Category, TestResult};
use crate::session::{SessionState, TestSession};

/// A recorded evaluation. Every section is optional; a sheet with missing
/// categories replays into a partial evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSheet {
    pub participant: Option<SheetParticipant>,
    pub body: Option<SheetBody>,
    pub strength: Option<StrengthSheet>,
    pub speed: Option<SpeedSheet>,
    pub flexibility: Option<FlexibilitySheet>,
    pub resistance: Option<ResistanceSheet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetParticipant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetBody {
    pub weight_kg: f64,
    pub height_cm: f64,
}

/// Completion times, one per strength exercise in battery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthSheet {
    pub times_secs: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSheet {
    pub time_secs: f64,
}

/// Reach distances, one per stretch in battery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexibilitySheet {
    pub distances_cm: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceSheet {
    pub time_secs: f64,
    pub distance_m: f64,
}

/// One exercise's recorded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Step {
    /// Seconds on the timer when it was stopped.
    pub elapsed_secs: Option<f64>,
    /// Typed measurement (distance or reach).
    pub input: Option<f64>,
}

impl Step {
    pub fn timed(secs: f64) -> Self {
        Self {
            elapsed_secs: Some(secs),
            input: None,
        }
    }

    pub fn manual(value: f64) -> Self {
        Self {
            elapsed_secs: None,
            input: Some(value),
        }
    }
}

/// Results of replaying a sheet.
#[derive(Debug, Default)]
pub struct SheetReplay {
    pub results: Vec<TestResult>,
    /// Categories whose measurements were refused, with the reason.
    pub rejected: Vec<(Category, String)>,
}

impl EvaluationSheet {
    pub fn participant_id(&self) -> Option<&str> {
        self.participant.as_ref().map(|p| p.id.as_str())
    }

    /// Validated body metrics, if the sheet has a `[body]` section.
    pub fn body_metrics(&self) -> Result<Option<BodyMetrics>, BodyError> {
        self.body
            .map(|b| BodyMetrics::new(b.weight_kg, b.height_cm))
            .transpose()
    }

    /// The recorded steps for a category, `None` if the section is absent.
    pub fn steps(&self, category: Category) -> Option<Vec<Step>> {
        match category {
            Category::Strength => self
                .strength
                .as_ref()
                .map(|s| s.times_secs.iter().copied().map(Step::timed).collect()),
            Category::Speed => self.speed.map(|s| vec![Step::timed(s.time_secs)]),
            Category::Flexibility => self
                .flexibility
                .as_ref()
                .map(|f| f.distances_cm.iter().copied().map(Step::manual).collect()),
            Category::Resistance => self.resistance.map(|r| {
                vec![Step {
                    elapsed_secs: Some(r.time_secs),
                    input: Some(r.distance_m),
                }]
            }),
        }
    }

    /// Replay every present section against the catalog.
    pub fn replay(&self, catalog: &Catalog) -> SheetReplay {
        let mut replay = SheetReplay::default();
        for category in Category::ALL {
            let Some(steps) = self.steps(category) else {
                continue;
            };
            match replay_category(catalog, category, &steps) {
                Ok(result) => replay.results.push(result),
                Err(e) => {
                    tracing::warn!(%category, error = %format!("{e:#}"), "sheet measurements rejected");
                    replay.rejected.push((category, format!("{e:#}")));
                }
            }
        }
        replay
    }
}

/// Drive a fresh session for `category` through the recorded steps.
pub fn replay_category(catalog: &Catalog, category: Category, steps: &[Step]) -> Result<TestResult> {
    let (mut session, mut completion) = TestSession::new(catalog, category)?;
    let (_, total) = session.position();
    if steps.len() != total {
        anyhow::bail!(
            "{category} needs {total} measurement(s), sheet has {}",
            steps.len()
        );
    }

    for step in steps {
        let exercise = session
            .current_exercise()
            .cloned()
            .with_context(|| format!("{category} session ended early"))?;

        if exercise.measurement.is_timed() {
            let secs = step
                .elapsed_secs
                .with_context(|| format!("{} needs a time", exercise.name))?;
            if !(secs.is_finite() && secs >= 0.0) {
                anyhow::bail!("{}: invalid time {secs}", exercise.name);
            }
            let ticks = (secs / exercise.tick.as_secs_f64()).round();
            session.start()?;
            session.advance_ticks(ticks.min(u32::MAX as f64) as u32)?;
            session
                .stop()
                .with_context(|| format!("{} could not be stopped", exercise.name))?;
        }

        if exercise.measurement.needs_input() {
            let value = step
                .input
                .with_context(|| format!("{} needs a measurement", exercise.name))?;
            if session.state() == SessionState::Idle {
                session.start()?;
            }
            session
                .submit_value(value)
                .with_context(|| format!("{} measurement refused", exercise.name))?;
        }
    }

    completion
        .try_take()
        .with_context(|| format!("{category} session did not complete"))
}
