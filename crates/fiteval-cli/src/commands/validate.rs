//! The `fiteval validate` command.

use std::path::PathBuf;

use anyhow::Result;

use fiteval_core::catalog::Catalog;
use fiteval_core::parser;

pub fn execute(rubrics_path: PathBuf) -> Result<()> {
    let tables = parser::load_rubrics(&rubrics_path)?;
    let catalog = Catalog::standard();

    for table in &tables {
        println!(
            "Rubric: {} ({}, {} breakpoints)",
            table.id(),
            table.name(),
            table.breakpoints().len()
        );
    }

    let warnings = parser::validate_rubrics(&tables, &catalog);
    for w in &warnings {
        println!("  [{}] WARNING: {}", w.rubric_id, w.message);
    }

    if tables.is_empty() {
        println!("No rubric tables found.");
    } else if warnings.is_empty() {
        println!("All rubrics valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
