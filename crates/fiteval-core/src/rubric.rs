//! Piecewise-linear scoring rubrics.
//!
//! A [`RubricTable`] maps a raw measurement to an integer 0–10 score through
//! an ordered list of breakpoints. Every exercise in the catalog is one table;
//! there is a single lookup routine shared by all of them.

use serde::{Deserialize, Serialize};

use crate::error::RubricError;
use crate::model::Unit;

/// Highest score a rubric can award.
pub const MAX_SCORE: u8 = 10;

/// Which way a measurement improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Larger raw values score higher (reach distance, running speed).
    #[default]
    HigherIsBetter,
    /// Smaller raw values score higher (sprint time, back-scratch gap).
    LowerIsBetter,
}

/// How a value strictly between two breakpoints is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// Linear interpolation between the two breakpoint scores.
    #[default]
    Linear,
    /// The lower of the span's two end scores, for step bands.
    Floor,
}

/// A `(threshold, score)` pair. `segment`, `from` and `to` describe the span
/// that leads to this breakpoint from the previous one and are ignored on the
/// first.
///
/// Inside that span the score runs from `from` (default: the previous
/// breakpoint's score) to `to` (default: this breakpoint's score). Setting
/// either one puts a jump at the corresponding threshold; the threshold
/// itself always scores exactly its breakpoint's `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub threshold: f64,
    pub score: u8,
    #[serde(default)]
    pub segment: Segment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u8>,
}

impl Breakpoint {
    /// Breakpoint reached by linear interpolation.
    pub const fn new(threshold: f64, score: u8) -> Self {
        Self {
            threshold,
            score,
            segment: Segment::Linear,
            from: None,
            to: None,
        }
    }

    /// Breakpoint reached through a flat step band.
    pub const fn floor(threshold: f64, score: u8) -> Self {
        Self {
            threshold,
            score,
            segment: Segment::Floor,
            from: None,
            to: None,
        }
    }

    /// Span starts at `score` right after the previous threshold.
    pub const fn starting_at(mut self, score: u8) -> Self {
        self.from = Some(score);
        self
    }

    /// Span approaches `score` just below this threshold.
    pub const fn approaching(mut self, score: u8) -> Self {
        self.to = Some(score);
        self
    }

    /// Score range of the span leading here from `prev`, open at both ends.
    fn span(&self, prev: &Breakpoint) -> (u8, u8) {
        (
            self.from.unwrap_or(prev.score),
            self.to.unwrap_or(self.score),
        )
    }
}

/// A validated scoring table for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RubricTable {
    id: String,
    name: String,
    unit: Unit,
    direction: Direction,
    domain: (f64, f64),
    breakpoints: Vec<Breakpoint>,
}

impl RubricTable {
    /// Build a table, checking every structural invariant.
    ///
    /// Thresholds must strictly increase, scores must stay within
    /// `0..=MAX_SCORE` and move monotonically in the table's direction, and
    /// the domain must be a finite, non-empty interval overlapping the
    /// breakpoints.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit: Unit,
        direction: Direction,
        domain: (f64, f64),
        breakpoints: Vec<Breakpoint>,
    ) -> Result<Self, RubricError> {
        let id = id.into();

        if breakpoints.len() < 2 {
            return Err(RubricError::TooFewBreakpoints(id));
        }

        for (index, bp) in breakpoints.iter().enumerate() {
            if !bp.threshold.is_finite() {
                return Err(RubricError::NonFinite { id, index });
            }
            let highest = [Some(bp.score), bp.from, bp.to].into_iter().flatten().max();
            if let Some(score) = highest.filter(|&s| s > MAX_SCORE) {
                return Err(RubricError::ScoreOutOfRange {
                    id,
                    index,
                    score,
                    max: MAX_SCORE,
                });
            }
            if index == 0 {
                continue;
            }
            let prev = &breakpoints[index - 1];
            if bp.threshold <= prev.threshold {
                return Err(RubricError::UnorderedThresholds { id, index });
            }
            let (start, end) = bp.span(prev);
            let ordered = |a: u8, b: u8| match direction {
                Direction::HigherIsBetter => a <= b,
                Direction::LowerIsBetter => a >= b,
            };
            if !(ordered(prev.score, start) && ordered(start, end) && ordered(end, bp.score)) {
                return Err(RubricError::NotMonotonic { id, index });
            }
        }

        let (min, max) = domain;
        let first = breakpoints[0].threshold;
        let last = breakpoints[breakpoints.len() - 1].threshold;
        if !min.is_finite() || !max.is_finite() || min >= max || max < first || min > last {
            return Err(RubricError::InvalidDomain { id, min, max });
        }

        Ok(Self {
            id,
            name: name.into(),
            unit,
            direction,
            domain,
            breakpoints,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Accepted measurement interval `(min, max)`; inputs outside clamp.
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Score a raw measurement on the 0–10 scale.
    ///
    /// Values are clamped to the domain, then to the terminal breakpoints.
    /// A value equal to a breakpoint threshold always yields that
    /// breakpoint's score. Interpolated values are rounded once, at the end.
    pub fn score(&self, value: f64) -> u8 {
        let (min, max) = self.domain;
        let v = if value.is_nan() {
            min
        } else {
            value.clamp(min, max)
        };

        let first = &self.breakpoints[0];
        let last = &self.breakpoints[self.breakpoints.len() - 1];
        if v <= first.threshold {
            return first.score;
        }
        if v >= last.threshold {
            return last.score;
        }

        for pair in self.breakpoints.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if v == hi.threshold {
                return hi.score;
            }
            if v < hi.threshold {
                let (start, end) = hi.span(lo);
                return match hi.segment {
                    Segment::Floor => start.min(end),
                    Segment::Linear => {
                        let ratio = (v - lo.threshold) / (hi.threshold - lo.threshold);
                        let raw = start as f64 + ratio * (end as f64 - start as f64);
                        round_score(raw, MAX_SCORE)
                    }
                };
            }
        }

        last.score
    }
}

fn round_score(raw: f64, max: u8) -> u8 {
    raw.round().clamp(0.0, max as f64) as u8
}

/// Rounded mean of non-negative integers, half rounding up, with no
/// floating-point intermediate.
fn rounded_mean(sum: u32, count: u32, scale: u32) -> u32 {
    (sum * scale * 2 + count) / (2 * count)
}

/// Scale a 0–10 mean to the presented 0–100 range.
pub fn scale_to_percent(mean: f64) -> u8 {
    round_score(mean * 10.0, 100)
}

/// Combine per-exercise 0–10 scores into a 0–100 category score.
///
/// Unweighted mean, times ten, rounded to the nearest integer. An empty
/// slice scores 0.
pub fn category_score(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u32 = scores.iter().map(|&s| s.min(MAX_SCORE) as u32).sum();
    rounded_mean(sum, scores.len() as u32, 10) as u8
}

/// Combine 0–100 category scores into the overall evaluation score.
pub fn overall_score(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u32 = scores.iter().map(|&s| s.min(100) as u32).sum();
    rounded_mean(sum, scores.len() as u32, 1) as u8
}
