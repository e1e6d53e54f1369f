//! Error types shared across the fiteval crates.
//!
//! Domain errors are plain `thiserror` enums. `SinkError` is defined here
//! rather than in `fiteval-sinks` so the forwarder can downcast and classify
//! sink failures for retry decisions without string matching.

use std::time::Duration;

use thiserror::Error;

use crate::model::Category;

/// A rubric table that violates one of its structural invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RubricError {
    #[error("rubric '{0}' needs at least two breakpoints")]
    TooFewBreakpoints(String),

    #[error("rubric '{id}' has a non-finite value at breakpoint {index}")]
    NonFinite { id: String, index: usize },

    #[error("rubric '{id}': thresholds must strictly increase (breakpoint {index})")]
    UnorderedThresholds { id: String, index: usize },

    #[error("rubric '{id}': score {score} at breakpoint {index} exceeds {max}")]
    ScoreOutOfRange {
        id: String,
        index: usize,
        score: u8,
        max: u8,
    },

    #[error("rubric '{id}': scores are not monotonic for its direction (breakpoint {index})")]
    NotMonotonic { id: String, index: usize },

    #[error("rubric '{id}': invalid domain [{min}, {max}]")]
    InvalidDomain { id: String, min: f64, max: f64 },
}

/// Rejected measurement input. The session stays where it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("'{0}' is not a number")]
    NotNumeric(String),

    #[error("{value} is outside the accepted range {min}–{max} {unit}")]
    OutOfRange {
        value: f64,
        min: f64,
        max: f64,
        unit: &'static str,
    },

    #[error("derived rate {rate:.1} {unit} exceeds the plausible maximum of {max} {unit}")]
    Implausible {
        rate: f64,
        max: f64,
        unit: &'static str,
    },
}

/// Errors raised by a test session or the evaluation aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("{exercise} needs at least {}s before it can be stopped ({:.1}s elapsed)", .minimum.as_secs_f64(), .elapsed.as_secs_f64())]
    TooEarly {
        exercise: String,
        minimum: Duration,
        elapsed: Duration,
    },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("{0} has already been scored in this evaluation")]
    AlreadyScored(Category),

    #[error("expected a {expected} result, got {actual}")]
    WrongCategory { expected: Category, actual: Category },

    #[error("no {0} battery in the catalog")]
    NoBattery(Category),

    #[error("no rubric '{0}' in the catalog")]
    UnknownRubric(String),
}

/// Invalid body measurements on the intake form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BodyError {
    #[error("weight must be greater than 0 and at most {max} kg, got {value}")]
    Weight { value: f64, max: f64 },

    #[error("height must be greater than 0 and at most {max} cm, got {value}")]
    Height { value: f64, max: f64 },
}

/// Participant registry failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("participant id must not be empty")]
    EmptyId,

    #[error("participant '{0}' is already registered")]
    Duplicate(String),

    #[error("no participant registered as '{0}'")]
    Unknown(String),
}

/// Errors that can occur when forwarding results to an external sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink refused our credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The sink rejected the payload itself; resending will not help.
    #[error("payload rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The sink asked us to slow down.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),
}

impl SinkError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(self, SinkError::Unauthorized(_) | SinkError::Rejected { .. })
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SinkError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
