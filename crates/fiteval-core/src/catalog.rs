//! Built-in exercises, their rubric tables, and the per-category batteries.
//!
//! Constants follow the field protocol used by the evaluation programme:
//! strength exercises are timed over a fixed number of repetitions, speed is
//! a 50 m sprint, flexibility is four reach measurements, and resistance is
//! distance covered in a timed run scored on average speed.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::error::InputError;
use crate::model::{Category, Unit};
use crate::rubric::{Breakpoint, Direction, RubricTable};

/// Plausible range for a manually entered value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
    /// Reject `min` itself (distances must be strictly positive).
    pub min_exclusive: bool,
    pub unit: Unit,
}

impl InputRange {
    pub const fn inclusive(min: f64, max: f64, unit: Unit) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            unit,
        }
    }

    pub const fn positive(max: f64, unit: Unit) -> Self {
        Self {
            min: 0.0,
            max,
            min_exclusive: true,
            unit,
        }
    }

    /// Check a value against the range.
    pub fn check(&self, value: f64) -> Result<(), InputError> {
        let above_min = if self.min_exclusive {
            value > self.min
        } else {
            value >= self.min
        };
        if above_min && value <= self.max {
            Ok(())
        } else {
            Err(InputError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
                unit: self.unit.symbol(),
            })
        }
    }
}

/// How an exercise produces the value its rubric scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    /// The elapsed time itself is scored.
    Timed,
    /// After the timer stops a distance is entered; `distance / elapsed`
    /// is scored and must not exceed `max_rate`.
    TimedDistance { input: InputRange, max_rate: f64 },
    /// No timer; the entered value is scored.
    Manual { input: InputRange },
}

impl Measurement {
    pub fn is_timed(&self) -> bool {
        !matches!(self, Measurement::Manual { .. })
    }

    pub fn needs_input(&self) -> bool {
        !matches!(self, Measurement::Timed)
    }
}

/// One exercise within a battery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub instructions: String,
    /// Fixed repetition count for timed strength work.
    pub repetitions: Option<u32>,
    /// Id of the rubric table that scores this exercise.
    pub rubric: String,
    pub measurement: Measurement,
    /// Timer resolution while running.
    pub tick: Duration,
    /// Stopping earlier than this is refused.
    pub min_elapsed: Duration,
}

/// The ordered exercises that make up one category's test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Battery {
    pub category: Category,
    pub exercises: Vec<Exercise>,
}

/// Rubric tables and batteries available to sessions.
#[derive(Debug, Clone)]
pub struct Catalog {
    rubrics: BTreeMap<String, RubricTable>,
    batteries: BTreeMap<Category, Battery>,
}

const ONE_SECOND: Duration = Duration::from_secs(1);
const TENTH_SECOND: Duration = Duration::from_millis(100);

/// Ceiling on running speed, about 28.8 km/h.
pub const MAX_RUNNING_SPEED: f64 = 8.0;

impl Catalog {
    /// The standard protocol.
    pub fn standard() -> Self {
        let rubrics = builtin_rubrics()
            .into_iter()
            .map(|t| (t.id().to_string(), t))
            .collect();
        let batteries = builtin_batteries()
            .into_iter()
            .map(|b| (b.category, b))
            .collect();
        Self { rubrics, batteries }
    }

    /// Replace rubric tables by id. Tables with ids no exercise uses are
    /// kept (they can still be scored directly) but logged.
    pub fn with_overrides(mut self, tables: Vec<RubricTable>) -> Self {
        for table in tables {
            if self.exercises_using(table.id()).next().is_none() {
                tracing::warn!("rubric '{}' is not used by any exercise", table.id());
            }
            tracing::debug!("overriding rubric '{}'", table.id());
            self.rubrics.insert(table.id().to_string(), table);
        }
        self
    }

    /// Exercises scored by the rubric `id`.
    pub fn exercises_using<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Exercise> + 'a {
        self.batteries
            .values()
            .flat_map(|b| &b.exercises)
            .filter(move |e| e.rubric == id)
    }

    pub fn rubric(&self, id: &str) -> Option<&RubricTable> {
        self.rubrics.get(id)
    }

    /// All rubric tables, ordered by id.
    pub fn rubrics(&self) -> impl Iterator<Item = &RubricTable> {
        self.rubrics.values()
    }

    pub fn battery(&self, category: Category) -> Option<&Battery> {
        self.batteries.get(&category)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn timed_strength(
    id: &str,
    name: &str,
    reps: u32,
    instructions: &str,
    min_secs: u64,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        instructions: instructions.into(),
        repetitions: Some(reps),
        rubric: id.into(),
        measurement: Measurement::Timed,
        tick: TENTH_SECOND,
        min_elapsed: Duration::from_secs(min_secs),
    }
}

fn reach(id: &str, name: &str, max_cm: f64, instructions: &str) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        instructions: instructions.into(),
        repetitions: None,
        rubric: id.into(),
        measurement: Measurement::Manual {
            input: InputRange::inclusive(0.0, max_cm, Unit::Centimeters),
        },
        tick: ONE_SECOND,
        min_elapsed: Duration::ZERO,
    }
}

fn builtin_batteries() -> Vec<Battery> {
    vec![
        Battery {
            category: Category::Strength,
            exercises: vec![
                timed_strength(
                    "push_ups",
                    "Push-ups",
                    15,
                    "15 push-ups, body straight, chest almost touching the floor.",
                    20,
                ),
                timed_strength(
                    "squats",
                    "Squats",
                    20,
                    "20 squats, knees to 90 degrees, back straight.",
                    25,
                ),
                timed_strength(
                    "pull_ups",
                    "Pull-ups",
                    10,
                    "10 pull-ups, chin above the bar.",
                    15,
                ),
                timed_strength(
                    "dips",
                    "Parallel-bar dips",
                    12,
                    "12 dips, elbows to 90 degrees then press up.",
                    20,
                ),
                timed_strength(
                    "deadlift",
                    "Dumbbell deadlift",
                    12,
                    "12 dumbbell deadlifts, lowering to mid-shin.",
                    20,
                ),
            ],
        },
        Battery {
            category: Category::Speed,
            exercises: vec![Exercise {
                id: "sprint_50m".into(),
                name: "50 m sprint".into(),
                instructions: "Run 50 m as fast as possible.".into(),
                repetitions: None,
                rubric: "sprint_50m".into(),
                measurement: Measurement::Timed,
                tick: ONE_SECOND,
                min_elapsed: Duration::from_secs(6),
            }],
        },
        Battery {
            category: Category::Flexibility,
            exercises: vec![
                reach(
                    "hamstring_reach",
                    "Hamstring reach",
                    45.0,
                    "Seated, legs straight; reach forward and measure past the toes.",
                ),
                reach(
                    "v_sit_reach",
                    "Seated V reach",
                    35.0,
                    "Seated with legs in a V; reach forward from the line between the ankles.",
                ),
                reach(
                    "lateral_flexion",
                    "Lateral trunk flexion",
                    30.0,
                    "Standing; slide a hand down the side and measure from the hip.",
                ),
                reach(
                    "back_scratch",
                    "Modified back scratch",
                    15.0,
                    "One hand over the shoulder, one up the back; measure the gap. 0 cm means touching.",
                ),
            ],
        },
        Battery {
            category: Category::Resistance,
            exercises: vec![Exercise {
                id: "timed_run".into(),
                name: "Timed run".into(),
                instructions: "Run for at least 60 s, then enter the distance covered.".into(),
                repetitions: None,
                rubric: "running_speed".into(),
                measurement: Measurement::TimedDistance {
                    input: InputRange::positive(100_000.0, Unit::Meters),
                    max_rate: MAX_RUNNING_SPEED,
                },
                tick: ONE_SECOND,
                min_elapsed: Duration::from_secs(60),
            }],
        },
    ]
}

fn lower_is_better_time(id: &str, name: &str, best: f64, limit: f64) -> RubricTable {
    table(
        id,
        name,
        Unit::Seconds,
        Direction::LowerIsBetter,
        (0.0, 600.0),
        vec![Breakpoint::new(best, 10), Breakpoint::new(limit, 0)],
    )
}

fn table(
    id: &str,
    name: &str,
    unit: Unit,
    direction: Direction,
    domain: (f64, f64),
    breakpoints: Vec<Breakpoint>,
) -> RubricTable {
    RubricTable::new(id, name, unit, direction, domain, breakpoints)
        .expect("built-in rubric tables are valid")
}

fn builtin_rubrics() -> Vec<RubricTable> {
    vec![
        lower_is_better_time("push_ups", "Push-ups", 20.0, 45.0),
        lower_is_better_time("squats", "Squats", 25.0, 50.0),
        lower_is_better_time("pull_ups", "Pull-ups", 15.0, 40.0),
        lower_is_better_time("dips", "Parallel-bar dips", 20.0, 45.0),
        lower_is_better_time("deadlift", "Dumbbell deadlift", 20.0, 45.0),
        table(
            "sprint_50m",
            "50 m sprint",
            Unit::Seconds,
            Direction::LowerIsBetter,
            (0.0, 120.0),
            vec![
                Breakpoint::new(6.0, 10),
                Breakpoint::floor(8.0, 8),
                Breakpoint::new(12.0, 0),
            ],
        ),
        table(
            "hamstring_reach",
            "Hamstring reach",
            Unit::Centimeters,
            Direction::HigherIsBetter,
            (0.0, 45.0),
            vec![
                Breakpoint::new(0.0, 0),
                Breakpoint::new(8.0, 2).starting_at(1),
                Breakpoint::new(9.0, 3).starting_at(3),
                Breakpoint::new(17.0, 4),
                Breakpoint::new(18.0, 5).starting_at(5),
                Breakpoint::new(25.0, 7),
                Breakpoint::new(26.0, 8).starting_at(8),
                Breakpoint::new(34.0, 9),
                Breakpoint::new(35.0, 10).starting_at(10),
            ],
        ),
        table(
            "v_sit_reach",
            "Seated V reach",
            Unit::Centimeters,
            Direction::HigherIsBetter,
            (0.0, 35.0),
            vec![
                Breakpoint::new(0.0, 0),
                Breakpoint::new(6.0, 2).starting_at(1),
                Breakpoint::new(7.0, 3).starting_at(3),
                Breakpoint::new(13.0, 4),
                Breakpoint::new(14.0, 5).starting_at(5),
                Breakpoint::new(22.0, 7),
                Breakpoint::new(23.0, 8).starting_at(8),
                Breakpoint::new(30.0, 9),
                Breakpoint::new(31.0, 10).starting_at(10),
            ],
        ),
        table(
            "lateral_flexion",
            "Lateral trunk flexion",
            Unit::Centimeters,
            Direction::HigherIsBetter,
            (0.0, 30.0),
            vec![
                Breakpoint::new(4.0, 0),
                Breakpoint::new(5.0, 1).starting_at(1),
                Breakpoint::new(8.0, 2),
                Breakpoint::new(9.0, 3).starting_at(3),
                // 9–14 cm rounds to 3 below 12 cm and 4 from there
                Breakpoint::floor(12.0, 4),
                Breakpoint::new(14.0, 4),
                Breakpoint::new(15.0, 5).starting_at(5),
                Breakpoint::new(18.0, 7),
                Breakpoint::new(19.0, 8).starting_at(8),
                Breakpoint::new(25.0, 9),
                Breakpoint::new(26.0, 10).starting_at(10),
            ],
        ),
        table(
            "back_scratch",
            "Modified back scratch",
            Unit::Centimeters,
            Direction::LowerIsBetter,
            (0.0, 15.0),
            vec![Breakpoint::new(0.0, 10), Breakpoint::new(15.0, 0)],
        ),
        table(
            "running_speed",
            "Running speed",
            Unit::MetersPerSecond,
            Direction::HigherIsBetter,
            (0.0, MAX_RUNNING_SPEED),
            vec![
                Breakpoint::new(0.0, 0),
                Breakpoint::floor(2.0, 1),
                Breakpoint::new(3.0, 4).approaching(3),
                Breakpoint::new(4.0, 7).approaching(6),
                Breakpoint::new(6.0, 10).approaching(9),
            ],
        ),
    ]
}
