//! TOML rubric and evaluation sheet parser.
//!
//! Loads rubric tables (used to override the built-in catalog) and
//! evaluation sheets (recorded measurements to replay through sessions).

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::Catalog;
use crate::model::Unit;
use crate::rubric::{Breakpoint, Direction, RubricTable};
use crate::sheet::EvaluationSheet;

/// Intermediate TOML structure for rubric files.
#[derive(Debug, Deserialize)]
struct TomlRubricFile {
    #[serde(default)]
    rubrics: Vec<TomlRubric>,
}

#[derive(Debug, Deserialize)]
struct TomlRubric {
    id: String,
    name: String,
    unit: String,
    #[serde(default)]
    direction: Direction,
    domain: [f64; 2],
    breakpoints: Vec<Breakpoint>,
}

/// Parse a single TOML file of rubric tables.
pub fn parse_rubric_file(path: &Path) -> Result<Vec<RubricTable>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rubric file: {}", path.display()))?;

    parse_rubrics_str(&content, path)
}

/// Parse rubric tables from a TOML string (useful for testing).
pub fn parse_rubrics_str(content: &str, source_path: &Path) -> Result<Vec<RubricTable>> {
    let parsed: TomlRubricFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut seen = HashSet::new();
    parsed
        .rubrics
        .into_iter()
        .map(|r| {
            if !seen.insert(r.id.clone()) {
                anyhow::bail!("duplicate rubric id '{}' in {}", r.id, source_path.display());
            }
            let unit: Unit = r.unit.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
            RubricTable::new(
                r.id,
                r.name,
                unit,
                r.direction,
                (r.domain[0], r.domain[1]),
                r.breakpoints,
            )
            .with_context(|| format!("invalid rubric in {}", source_path.display()))
        })
        .collect()
}

/// Recursively load all `.toml` rubric files from a directory.
///
/// An invalid file is an error, not skipped.
pub fn load_rubric_directory(dir: &Path) -> Result<Vec<RubricTable>> {
    let mut tables = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            tables.extend(load_rubric_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            tables.extend(parse_rubric_file(&path)?);
        }
    }

    Ok(tables)
}

/// Load rubric tables from a file or a directory.
pub fn load_rubrics(path: &Path) -> Result<Vec<RubricTable>> {
    if path.is_dir() {
        load_rubric_directory(path)
    } else {
        parse_rubric_file(path)
    }
}

/// A validation warning (non-fatal) for a rubric table.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricWarning {
    pub rubric_id: String,
    pub message: String,
}

/// Check override tables against the catalog they would be applied to.
pub fn validate_rubrics(tables: &[RubricTable], catalog: &Catalog) -> Vec<RubricWarning> {
    let mut warnings = Vec::new();
    let mut warn = |table: &RubricTable, message: String| {
        warnings.push(RubricWarning {
            rubric_id: table.id().to_string(),
            message,
        })
    };

    for table in tables {
        if catalog.exercises_using(table.id()).next().is_none() {
            warn(
                table,
                "not used by any exercise; it can only be scored directly".into(),
            );
        }
        if let Some(current) = catalog.rubric(table.id()) {
            if current.unit() != table.unit() {
                warn(
                    table,
                    format!(
                        "unit '{}' differs from the replaced table's '{}'",
                        table.unit(),
                        current.unit()
                    ),
                );
            }
            if current.direction() != table.direction() {
                warn(table, "direction differs from the replaced table".into());
            }
        }
    }

    warnings
}

/// Parse an evaluation sheet file.
pub fn parse_sheet(path: &Path) -> Result<EvaluationSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read evaluation sheet: {}", path.display()))?;

    parse_sheet_str(&content, path)
}

/// Parse an evaluation sheet from a TOML string.
pub fn parse_sheet_str(content: &str, source_path: &Path) -> Result<EvaluationSheet> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}
