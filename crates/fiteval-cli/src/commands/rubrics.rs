//! The `fiteval rubrics` command.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use fiteval_core::model::Category;
use fiteval_core::rubric::{Direction, RubricTable, Segment};
use fiteval_sinks::load_config_from;

pub fn execute(
    category: Option<String>,
    rubrics: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = super::load_catalog(&config, rubrics.as_deref())?;

    let categories: Vec<Category> = match &category {
        Some(c) => vec![c.parse().map_err(anyhow::Error::msg)?],
        None => Category::ALL.to_vec(),
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Category",
            "Exercise",
            "Rubric",
            "Unit",
            "Better",
            "Breakpoints",
        ]);

    let mut listed = BTreeSet::new();
    for category in categories {
        let Some(battery) = catalog.battery(category) else {
            continue;
        };
        for exercise in &battery.exercises {
            let Some(rubric) = catalog.rubric(&exercise.rubric) else {
                continue;
            };
            listed.insert(rubric.id().to_string());
            table.add_row(rubric_row(category.to_string(), &exercise.name, rubric));
        }
    }

    // Standalone tables only make sense in the unfiltered listing.
    if category.is_none() {
        for rubric in catalog.rubrics().filter(|r| !listed.contains(r.id())) {
            table.add_row(rubric_row("-".into(), "-", rubric));
        }
    }

    println!("{table}");
    Ok(())
}

fn rubric_row(category: String, exercise: &str, rubric: &RubricTable) -> Vec<Cell> {
    vec![
        Cell::new(category),
        Cell::new(exercise),
        Cell::new(rubric.id()),
        Cell::new(rubric.unit().symbol()),
        Cell::new(match rubric.direction() {
            Direction::HigherIsBetter => "higher",
            Direction::LowerIsBetter => "lower",
        }),
        Cell::new(format_breakpoints(rubric)),
    ]
}

fn format_breakpoints(rubric: &RubricTable) -> String {
    rubric
        .breakpoints()
        .iter()
        .map(|b| {
            let mut text = format!("{}→{}", b.threshold, b.score);
            if b.segment == Segment::Floor {
                text.push_str(" (step)");
            }
            if let Some(from) = b.from {
                text.push_str(&format!(" (from {from})"));
            }
            if let Some(to) = b.to {
                text.push_str(&format!(" (up to {to})"));
            }
            text
        })
        .collect::<Vec<_>>()
        .join(", ")
}
