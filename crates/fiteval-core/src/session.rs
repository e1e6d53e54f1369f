//! Test session controller.
//!
//! A [`TestSession`] walks one category's battery of exercises through
//! `Idle -> Running -> AwaitingInput -> Scored`. Time is fed in as ticks by
//! the caller (a [`crate::ticker::Ticker`] or a replayed measurement), so the
//! controller itself never reads a clock. When the last exercise is scored
//! the category result is sent exactly once on the session's [`Completion`]
//! channel.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::catalog::{Battery, Catalog, Exercise, Measurement};
use crate::error::{InputError, SessionError};
use crate::model::{Category, TestResult};
use crate::rubric::{category_score, RubricTable};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    AwaitingInput,
    Scored,
    Cancelled,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::AwaitingInput => "awaiting input",
            SessionState::Scored => "scored",
            SessionState::Cancelled => "cancelled",
        }
    }

    /// `Scored` and `Cancelled` accept no further actions.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Scored | SessionState::Cancelled)
    }
}

/// The scored outcome of a single exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseOutcome {
    pub exercise_id: String,
    /// Value fed to the rubric: seconds, centimetres, or m/s.
    pub measured: f64,
    /// 0–10.
    pub score: u8,
}

/// What an accepted action led to.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// The timer is running.
    Started,
    /// The session is waiting for a measurement.
    AwaitingInput,
    /// An exercise was scored and the next one is ready.
    Next(ExerciseOutcome),
    /// The whole battery is scored.
    Completed(TestResult),
}

/// Receiving half of a session's result channel.
#[derive(Debug)]
pub struct Completion {
    category: Category,
    rx: oneshot::Receiver<TestResult>,
}

impl Completion {
    pub fn category(&self) -> Category {
        self.category
    }

    /// Wait for the result. `None` if the session was cancelled or dropped.
    pub async fn wait(self) -> Option<TestResult> {
        self.rx.await.ok()
    }

    /// Take the result if it has already been produced.
    pub fn try_take(&mut self) -> Option<TestResult> {
        self.rx.try_recv().ok()
    }
}

/// Controller for one category's test.
#[derive(Debug)]
pub struct TestSession {
    battery: Battery,
    rubrics: Vec<RubricTable>,
    state: SessionState,
    current: usize,
    ticks: u32,
    outcomes: Vec<ExerciseOutcome>,
    completion: Option<oneshot::Sender<TestResult>>,
    result: Option<TestResult>,
}

impl TestSession {
    /// Create a session for `category` using the catalog's battery and
    /// rubric tables.
    pub fn new(catalog: &Catalog, category: Category) -> Result<(Self, Completion), SessionError> {
        let battery = catalog
            .battery(category)
            .cloned()
            .ok_or(SessionError::NoBattery(category))?;
        if battery.exercises.is_empty() {
            return Err(SessionError::NoBattery(category));
        }
        let rubrics = battery
            .exercises
            .iter()
            .map(|e| {
                catalog
                    .rubric(&e.rubric)
                    .cloned()
                    .ok_or_else(|| SessionError::UnknownRubric(e.rubric.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (tx, rx) = oneshot::channel();
        let session = Self {
            battery,
            rubrics,
            state: SessionState::Idle,
            current: 0,
            ticks: 0,
            outcomes: Vec::new(),
            completion: Some(tx),
            result: None,
        };
        Ok((session, Completion { category, rx }))
    }

    pub fn category(&self) -> Category {
        self.battery.category
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The exercise in progress, `None` once the session is terminal.
    pub fn current_exercise(&self) -> Option<&Exercise> {
        if self.state.is_terminal() {
            None
        } else {
            self.battery.exercises.get(self.current)
        }
    }

    /// Zero-based index of the exercise in progress and the battery size.
    pub fn position(&self) -> (usize, usize) {
        (self.current, self.battery.exercises.len())
    }

    /// Elapsed time on the current exercise.
    pub fn elapsed(&self) -> Duration {
        self.exercise().tick * self.ticks
    }

    pub fn outcomes(&self) -> &[ExerciseOutcome] {
        &self.outcomes
    }

    /// The category result once `Scored`.
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    fn exercise(&self) -> &Exercise {
        &self.battery.exercises[self.current]
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }

    /// Begin the current exercise: the timer starts, or for manually
    /// measured exercises the session waits for input straight away.
    pub fn start(&mut self) -> Result<Progress, SessionError> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("start"));
        }
        self.ticks = 0;
        if self.exercise().measurement.is_timed() {
            self.state = SessionState::Running;
            tracing::debug!(category = %self.category(), exercise = %self.exercise().id, "timer started");
            Ok(Progress::Started)
        } else {
            self.state = SessionState::AwaitingInput;
            Ok(Progress::AwaitingInput)
        }
    }

    /// Advance the timer by one tick and return the new elapsed time.
    pub fn tick(&mut self) -> Result<Duration, SessionError> {
        self.advance_ticks(1)
    }

    /// Advance the timer by `n` ticks at once.
    pub fn advance_ticks(&mut self, n: u32) -> Result<Duration, SessionError> {
        if self.state != SessionState::Running {
            return Err(self.invalid("tick"));
        }
        self.ticks = self.ticks.saturating_add(n);
        Ok(self.elapsed())
    }

    /// Stop the timer. Refused until the exercise's minimum time has passed.
    pub fn stop(&mut self) -> Result<Progress, SessionError> {
        if self.state != SessionState::Running {
            return Err(self.invalid("stop"));
        }
        let elapsed = self.elapsed();
        let exercise = self.exercise();
        if elapsed < exercise.min_elapsed {
            return Err(SessionError::TooEarly {
                exercise: exercise.name.clone(),
                minimum: exercise.min_elapsed,
                elapsed,
            });
        }
        tracing::debug!(
            category = %self.category(),
            exercise = %exercise.id,
            elapsed_secs = elapsed.as_secs_f64(),
            "timer stopped"
        );
        let measurement = exercise.measurement;
        match measurement {
            Measurement::Timed => {
                let secs = elapsed.as_secs_f64();
                let score = self.rubrics[self.current].score(secs);
                Ok(self.finish_exercise(secs, score))
            }
            Measurement::TimedDistance { .. } | Measurement::Manual { .. } => {
                self.state = SessionState::AwaitingInput;
                Ok(Progress::AwaitingInput)
            }
        }
    }

    /// Parse and submit a typed measurement. Accepts a decimal comma.
    pub fn submit_input(&mut self, text: &str) -> Result<Progress, SessionError> {
        if self.state != SessionState::AwaitingInput {
            return Err(self.invalid("submit input"));
        }
        let value = parse_measurement(text)?;
        self.submit_value(value)
    }

    /// Submit a measurement. On any error the session stays in
    /// `AwaitingInput` so the value can be re-entered.
    pub fn submit_value(&mut self, value: f64) -> Result<Progress, SessionError> {
        if self.state != SessionState::AwaitingInput {
            return Err(self.invalid("submit input"));
        }
        if !value.is_finite() {
            return Err(InputError::NotNumeric(value.to_string()).into());
        }
        let measurement = self.exercise().measurement;
        let measured = match measurement {
            Measurement::Manual { input } => {
                input.check(value)?;
                value
            }
            Measurement::TimedDistance { input, max_rate } => {
                input.check(value)?;
                let secs = self.elapsed().as_secs_f64();
                let rate = value / secs;
                if rate > max_rate {
                    tracing::debug!(rate, max_rate, "implausible rate rejected");
                    return Err(InputError::Implausible {
                        rate,
                        max: max_rate,
                        unit: "m/s",
                    }
                    .into());
                }
                rate
            }
            Measurement::Timed => return Err(self.invalid("submit input")),
        };
        let score = self.rubrics[self.current].score(measured);
        Ok(self.finish_exercise(measured, score))
    }

    /// Abandon the session. Nothing is emitted and in-progress outcomes are
    /// discarded.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Scored => Err(self.invalid("cancel")),
            SessionState::Cancelled => Ok(()),
            _ => {
                tracing::debug!(category = %self.category(), "session cancelled");
                self.state = SessionState::Cancelled;
                self.outcomes.clear();
                self.ticks = 0;
                self.completion = None;
                Ok(())
            }
        }
    }

    fn finish_exercise(&mut self, measured: f64, score: u8) -> Progress {
        let outcome = ExerciseOutcome {
            exercise_id: self.exercise().id.clone(),
            measured,
            score,
        };
        tracing::debug!(
            category = %self.category(),
            exercise = %outcome.exercise_id,
            measured,
            score,
            "exercise scored"
        );
        self.outcomes.push(outcome.clone());
        self.ticks = 0;

        if self.current + 1 < self.battery.exercises.len() {
            self.current += 1;
            self.state = if self.exercise().measurement.is_timed() {
                SessionState::Idle
            } else {
                SessionState::AwaitingInput
            };
            return Progress::Next(outcome);
        }

        let scores: Vec<u8> = self.outcomes.iter().map(|o| o.score).collect();
        let raw = self.outcomes.iter().map(|o| o.measured).sum::<f64>() / self.outcomes.len() as f64;
        let result = TestResult::new(self.category(), raw, category_score(&scores), Utc::now());
        self.state = SessionState::Scored;
        self.result = Some(result.clone());
        if let Some(tx) = self.completion.take() {
            // The receiver may already be gone; the result stays readable here.
            let _ = tx.send(result.clone());
        }
        tracing::info!(category = %result.category(), score = result.score(), "category scored");
        Progress::Completed(result)
    }
}

/// Parse a typed measurement, accepting a decimal comma.
pub fn parse_measurement(text: &str) -> Result<f64, InputError> {
    let trimmed = text.trim();
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InputError::NotNumeric(trimmed.to_string()))
}
