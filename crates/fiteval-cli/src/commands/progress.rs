//! The `fiteval progress` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use fiteval_core::model::Category;
use fiteval_core::statistics::ProgressHistory;
use fiteval_report::write_progress_html;

pub fn execute(history_path: PathBuf, html: Option<PathBuf>) -> Result<()> {
    let history = ProgressHistory::load_json(&history_path)?;

    if let Some(id) = history.participant_id() {
        println!("Participant: {id}");
    }
    if history.is_empty() {
        println!("No evaluations recorded yet.");
        return Ok(());
    }

    let mut table = Table::new();
    let mut header = vec!["Date".to_string()];
    header.extend(Category::ALL.iter().map(|c| c.to_string()));
    header.extend(["overall".to_string(), "BMI".to_string()]);
    table.set_header(header);

    for entry in history.entries() {
        let mut row = vec![Cell::new(entry.date)];
        row.extend(Category::ALL.map(|c| Cell::new(entry.score(c))));
        row.push(Cell::new(entry.overall()));
        row.push(Cell::new(&entry.bmi));
        table.add_row(row);
    }

    let averages = history.averages();
    let mut row = vec![Cell::new("average")];
    row.extend(Category::ALL.map(|c| Cell::new(averages.score(c))));
    row.push(Cell::new(averages.general));
    row.push(Cell::new(""));
    table.add_row(row);

    println!("{table}");

    if history.len() > 1 {
        let trends: Vec<String> = Category::ALL
            .iter()
            .map(|&c| format!("{c} {:+}", history.trend(c)))
            .collect();
        println!("Trend since first evaluation: {}", trends.join(", "));
    }

    if let Some(path) = html {
        write_progress_html(&history, &path)?;
        eprintln!("HTML report: {}", path.display());
    }

    Ok(())
}
