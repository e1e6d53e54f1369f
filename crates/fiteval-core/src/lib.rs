//! fiteval-core — Scoring rubrics, test sessions, and evaluation aggregation.
//!
//! This crate defines the data model, the piecewise-linear rubric engine,
//! the per-category session controllers, and the result-sink trait that the
//! rest of the fiteval workspace builds on.

pub mod body;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod parser;
pub mod registry;
pub mod report;
pub mod rubric;
pub mod session;
pub mod sheet;
pub mod statistics;
pub mod ticker;
pub mod traits;
