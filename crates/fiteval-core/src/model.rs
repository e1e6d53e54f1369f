//! Core data model types for fiteval.
//!
//! These are the fundamental types that flow from a finished test session
//! through the aggregator into reports and sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::body::BmiCategory;

/// One of the four fitness dimensions of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Strength,
    Speed,
    Flexibility,
    Resistance,
}

impl Category {
    /// All categories in presentation order.
    pub const ALL: [Category; 4] = [
        Category::Strength,
        Category::Speed,
        Category::Flexibility,
        Category::Resistance,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Strength => 0,
            Category::Speed => 1,
            Category::Flexibility => 2,
            Category::Resistance => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Strength => write!(f, "strength"),
            Category::Speed => write!(f, "speed"),
            Category::Flexibility => write!(f, "flexibility"),
            Category::Resistance => write!(f, "resistance"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strength" | "fuerza" => Ok(Category::Strength),
            "speed" | "velocidad" => Ok(Category::Speed),
            "flexibility" | "flexibilidad" => Ok(Category::Flexibility),
            "resistance" | "endurance" | "resistencia" => Ok(Category::Resistance),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Physical unit of a raw measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Seconds,
    Meters,
    Centimeters,
    Repetitions,
    MetersPerSecond,
}

impl Unit {
    /// Short symbol used in messages and tables.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Seconds => "s",
            Unit::Meters => "m",
            Unit::Centimeters => "cm",
            Unit::Repetitions => "reps",
            Unit::MetersPerSecond => "m/s",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(Unit::Seconds),
            "m" | "meters" | "metres" => Ok(Unit::Meters),
            "cm" | "centimeters" | "centimetres" => Ok(Unit::Centimeters),
            "reps" | "repetitions" => Ok(Unit::Repetitions),
            "m/s" | "meters_per_second" | "mps" => Ok(Unit::MetersPerSecond),
            other => Err(format!("unknown unit: {other}")),
        }
    }
}

/// The finished, scored outcome of one category's test session.
///
/// Fields are private: a result is never edited after the session that
/// produced it reaches `Scored`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    category: Category,
    raw_value: f64,
    score: u8,
    timestamp: DateTime<Utc>,
}

impl TestResult {
    /// Build a result. The score is clamped to 0–100.
    pub fn new(category: Category, raw_value: f64, score: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            category,
            raw_value,
            score: score.min(100),
            timestamp,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The measurement the score was derived from (seconds, cm, m/s...).
    pub fn raw_value(&self) -> f64 {
        self.raw_value
    }

    /// Presented score, 0–100.
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Combined outcome of all four categories plus BMI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Unique evaluation identifier.
    pub id: Uuid,
    /// Student or participant id the evaluation belongs to.
    #[serde(default)]
    pub participant_id: Option<String>,
    /// When the summary was built.
    pub created_at: DateTime<Utc>,
    pub strength: u8,
    pub speed: u8,
    pub flexibility: u8,
    pub resistance: u8,
    /// Rounded mean of the four category scores.
    pub overall: u8,
    /// BMI formatted to two decimals, empty when no body metrics were given.
    #[serde(default)]
    pub bmi: String,
    #[serde(default)]
    pub bmi_category: Option<BmiCategory>,
    /// The individual results, in category order.
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl EvaluationSummary {
    /// Score for a single category.
    pub fn score(&self, category: Category) -> u8 {
        match category {
            Category::Strength => self.strength,
            Category::Speed => self.speed,
            Category::Flexibility => self.flexibility,
            Category::Resistance => self.resistance,
        }
    }
}
