//! The `fiteval score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use fiteval_core::session::parse_measurement;
use fiteval_sinks::load_config_from;

pub fn execute(
    rubric_id: String,
    value: String,
    json: bool,
    rubrics: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = super::load_catalog(&config, rubrics.as_deref())?;

    let table = catalog.rubric(&rubric_id).with_context(|| {
        let known: Vec<&str> = catalog.rubrics().map(|t| t.id()).collect();
        format!(
            "unknown rubric '{rubric_id}' (available: {})",
            known.join(", ")
        )
    })?;
    let value = parse_measurement(&value)?;
    let score = table.score(value);

    if json {
        let out = serde_json::json!({
            "rubric": table.id(),
            "value": value,
            "unit": table.unit().symbol(),
            "score": score,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{} ({}): {value} {} -> {score}/10",
            table.id(),
            table.name(),
            table.unit().symbol()
        );
    }

    Ok(())
}
