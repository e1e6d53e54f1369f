//! The `fiteval evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use fiteval_core::engine::Forwarder;
use fiteval_core::evaluation::Evaluation;
use fiteval_core::model::{Category, EvaluationSummary};
use fiteval_core::parser;
use fiteval_core::registry::ParticipantRegistry;
use fiteval_core::statistics::ProgressHistory;
use fiteval_report::write_summary_html;
use fiteval_sinks::{create_named_sink, load_config_from, FitevalConfig};

pub struct EvaluateArgs {
    pub sheet: PathBuf,
    pub output: Option<PathBuf>,
    pub format: String,
    pub sink: Option<String>,
    pub no_forward: bool,
    pub history: Option<PathBuf>,
    pub roster: Option<PathBuf>,
    pub rubrics: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let catalog = super::load_catalog(&config, args.rubrics.as_deref())?;
    let sheet = parser::parse_sheet(&args.sheet)?;
    tracing::debug!(sheet = %args.sheet.display(), "replaying evaluation sheet");

    let mut evaluation = Evaluation::new();
    if let Some(id) = sheet.participant_id() {
        if let Some(roster) = &args.roster {
            let registry = ParticipantRegistry::load(roster)?;
            let participant = registry.require(id)?;
            eprintln!("Participant: {} ({})", participant.id, participant.name);
        }
        evaluation = evaluation.with_participant(id);
    } else if args.roster.is_some() {
        anyhow::bail!("sheet has no [participant] section to check against the roster");
    }
    if let Some(body) = sheet.body_metrics().context("invalid [body] section")? {
        evaluation = evaluation.with_body(body);
    }

    let replay = sheet.replay(&catalog);
    for result in replay.results {
        evaluation.record(result)?;
    }
    for (category, reason) in &replay.rejected {
        eprintln!("Rejected {category}: {reason}");
    }

    print_results(&evaluation);

    if !replay.rejected.is_empty() {
        anyhow::bail!(
            "{} category result(s) rejected; fix the sheet and re-run",
            replay.rejected.len()
        );
    }

    let Some(summary) = evaluation.summary() else {
        let missing: Vec<String> = evaluation.missing().iter().map(|c| c.to_string()).collect();
        eprintln!(
            "\nEvaluation incomplete, missing: {}. No summary produced.",
            missing.join(", ")
        );
        return Ok(());
    };

    println!("\nOverall: {}", summary.overall);
    match summary.bmi_category {
        Some(band) => println!("BMI: {} ({band})", summary.bmi),
        None => println!("BMI: {}", summary.bmi),
    }

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    write_outputs(&summary, &output, &args.format)?;

    if !args.no_forward {
        if let Some(sink_name) = args.sink.as_deref().or(config.default_sink.as_deref()) {
            forward(&config, sink_name, &summary).await;
        }
    }

    if let Some(path) = &args.history {
        let mut history = ProgressHistory::load_or_default(path)?;
        if let (Some(owner), Some(id)) = (history.participant_id(), summary.participant_id.as_deref()) {
            if !owner.eq_ignore_ascii_case(id) {
                anyhow::bail!("{} is the history of {owner}, not {id}", path.display());
            }
        }
        history.record(&summary);
        history.save_json(path)?;
        eprintln!(
            "History updated: {} ({} day(s))",
            path.display(),
            history.len()
        );
    }

    Ok(())
}

fn print_results(evaluation: &Evaluation) {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Raw", "Score"]);

    for category in Category::ALL {
        let row = match evaluation.result(category) {
            Some(r) => vec![
                Cell::new(category),
                Cell::new(format!("{:.2}", r.raw_value())),
                Cell::new(r.score()),
            ],
            None => vec![Cell::new(category), Cell::new("-"), Cell::new("-")],
        };
        table.add_row(row);
    }

    println!("{table}");
}

fn write_outputs(summary: &EvaluationSummary, output: &std::path::Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;
    let stem = format!(
        "evaluation-{}-{}",
        file_safe(summary.participant_id.as_deref().unwrap_or("anonymous")),
        summary.created_at.format("%Y-%m-%dT%H%M%S")
    );

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "md"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in formats {
        match fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                summary.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_summary_html(summary, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "md" => {
                let path = output.join(format!("{stem}.md"));
                std::fs::write(&path, summary.to_markdown())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
            other => {
                eprintln!("Unknown format: {other}");
            }
        }
    }

    Ok(())
}

/// Participant ids come from the sheet; keep them from naming paths.
fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Failures here never fail the command: the results are already saved.
async fn forward(config: &FitevalConfig, sink_name: &str, summary: &EvaluationSummary) {
    let sink = match create_named_sink(config, sink_name) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Warning: results not forwarded: {e:#}");
            return;
        }
    };

    let forwarder = Forwarder::new(sink, config.forwarder_config());
    let report = forwarder.forward(summary).await;
    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }
    eprintln!(
        "Forwarded to {}: {}/{} delivered",
        report.sink, report.delivered, report.attempted
    );
}
