//! The `fiteval init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create fiteval.toml
    if std::path::Path::new("fiteval.toml").exists() {
        println!("fiteval.toml already exists, skipping.");
    } else {
        std::fs::write("fiteval.toml", SAMPLE_CONFIG)?;
        println!("Created fiteval.toml");
    }

    // Create example sheet
    std::fs::create_dir_all("sheets")?;
    let example_path = std::path::Path::new("sheets/example.toml");
    if example_path.exists() {
        println!("sheets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SHEET)?;
        println!("Created sheets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit fiteval.toml with your results API");
    println!("  2. Run: fiteval evaluate --sheet sheets/example.toml --no-forward");
    println!("  3. Run: fiteval evaluate --sheet sheets/example.toml --history progress.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# fiteval configuration

# default_sink = "school"
max_retries = 3
retry_delay_ms = 1000
parallelism = 4
output_dir = "./fiteval-results"
# rubric_files = ["rubrics/"]

[sinks.school]
type = "http"
base_url = "${FITEVAL_API_URL}"
api_token = "${FITEVAL_API_TOKEN}"

[sinks.offline]
type = "memory"
"#;

const EXAMPLE_SHEET: &str = r#"# Recorded measurements for one evaluation.

[participant]
id = "ZS24000001"
name = "Example Participant"

[body]
weight_kg = 70.0
height_cm = 175.0

# Seconds per exercise: push-ups, squats, pull-ups, dips, deadlift.
[strength]
times_secs = [20.0, 25.0, 15.0, 20.0, 20.0]

# 50 m sprint.
[speed]
time_secs = 7.0

# Centimetres: hamstring reach, seated V reach, lateral flexion, back-scratch gap.
[flexibility]
distances_cm = [35.0, 31.0, 26.0, 7.5]

# Timed run: at least 60 s.
[resistance]
time_secs = 60.0
distance_m = 240.0
"#;
