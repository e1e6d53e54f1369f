pub mod bmi;
pub mod evaluate;
pub mod init;
pub mod live;
pub mod progress;
pub mod rubrics;
pub mod score;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use fiteval_core::catalog::Catalog;
use fiteval_core::parser;
use fiteval_sinks::FitevalConfig;

/// The built-in catalog with rubric overrides from the config file and from
/// an explicit `--rubrics` path applied, in that order.
pub fn load_catalog(config: &FitevalConfig, extra: Option<&Path>) -> Result<Catalog> {
    let mut tables = Vec::new();
    for path in &config.rubric_files {
        tables.extend(parser::load_rubrics(path)?);
    }
    if let Some(path) = extra {
        tables.extend(parser::load_rubrics(path)?);
    }
    Ok(Catalog::standard().with_overrides(tables))
}
