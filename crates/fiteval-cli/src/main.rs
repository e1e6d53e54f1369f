//! fiteval CLI — score measurements, run test sessions, and report results.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fiteval", version, about = "Fitness evaluation scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single measurement against a rubric
    Score {
        /// Rubric id (e.g. "sprint_50m")
        #[arg(long)]
        rubric: String,

        /// Measured value in the rubric's unit
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Extra rubric file or directory
        #[arg(long)]
        rubrics: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List rubric tables and the exercises they score
    Rubrics {
        /// Only show one category (strength, speed, flexibility, resistance)
        #[arg(long)]
        category: Option<String>,

        /// Extra rubric file or directory
        #[arg(long)]
        rubrics: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate rubric TOML files
    Validate {
        /// Path to rubric file or directory
        #[arg(long)]
        rubrics: PathBuf,
    },

    /// Score a recorded evaluation sheet
    Evaluate {
        /// Path to the sheet .toml
        #[arg(long)]
        sheet: PathBuf,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output formats: json, html, md, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Forward results to this configured sink
        #[arg(long)]
        sink: Option<String>,

        /// Skip forwarding even if a default sink is configured
        #[arg(long, conflicts_with = "sink")]
        no_forward: bool,

        /// Progress history file to append the result to
        #[arg(long)]
        history: Option<PathBuf>,

        /// Participant roster; the sheet's participant must be listed
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Extra rubric file or directory
        #[arg(long)]
        rubrics: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run one category's test interactively
    Live {
        /// Category to test
        #[arg(long)]
        category: String,

        /// Extra rubric file or directory
        #[arg(long)]
        rubrics: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show averages and trends from a progress history
    Progress {
        /// Progress history JSON
        #[arg(long)]
        history: PathBuf,

        /// Also write an HTML report here
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Compute body mass index
    Bmi {
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,

        /// Height in centimetres
        #[arg(long)]
        height: f64,
    },

    /// Create starter config and example sheet
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fiteval=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            rubric,
            value,
            json,
            rubrics,
            config,
        } => commands::score::execute(rubric, value, json, rubrics, config),
        Commands::Rubrics {
            category,
            rubrics,
            config,
        } => commands::rubrics::execute(category, rubrics, config),
        Commands::Validate { rubrics } => commands::validate::execute(rubrics),
        Commands::Evaluate {
            sheet,
            output,
            format,
            sink,
            no_forward,
            history,
            roster,
            rubrics,
            config,
        } => {
            commands::evaluate::execute(commands::evaluate::EvaluateArgs {
                sheet,
                output,
                format,
                sink,
                no_forward,
                history,
                roster,
                rubrics,
                config,
            })
            .await
        }
        Commands::Live {
            category,
            rubrics,
            config,
        } => commands::live::execute(category, rubrics, config).await,
        Commands::Progress { history, html } => commands::progress::execute(history, html),
        Commands::Bmi { weight, height } => commands::bmi::execute(weight, height),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
