//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fiteval() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("fiteval").unwrap();
    // Keep a developer's environment out of the tests.
    cmd.env_remove("FITEVAL_API_URL")
        .env_remove("FITEVAL_API_TOKEN")
        .env("HOME", std::env::temp_dir());
    cmd
}

const FULL_SHEET: &str = r#"
[participant]
id = "ZS24000001"

[body]
weight_kg = 70.0
height_cm = 175.0

[strength]
times_secs = [20.0, 25.0, 15.0, 20.0, 20.0]

[speed]
time_secs = 7.0

[flexibility]
distances_cm = [35.0, 31.0, 26.0, 7.5]

[resistance]
time_secs = 60.0
distance_m = 240.0
"#;

const OVERRIDE_RUBRICS: &str = r#"
[[rubrics]]
id = "sprint_50m"
name = "50 m sprint (junior)"
unit = "s"
direction = "lower_is_better"
domain = [0.0, 120.0]
breakpoints = [
    { threshold = 7.0, score = 10 },
    { threshold = 13.0, score = 0 },
]
"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn score_builtin_rubric() {
    fiteval()
        .args(["score", "--rubric", "sprint_50m", "--value", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-> 8/10"));
}

#[test]
fn score_accepts_decimal_comma() {
    fiteval()
        .args(["score", "--rubric", "hamstring_reach", "--value", "34,0", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"score\": 9"))
        .stdout(predicate::str::contains("\"unit\": \"cm\""));
}

#[test]
fn score_unknown_rubric() {
    fiteval()
        .args(["score", "--rubric", "plank", "--value", "60"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: unknown rubric 'plank'"))
        .stderr(predicate::str::contains("sprint_50m"));
}

#[test]
fn score_with_override_file() {
    let dir = TempDir::new().unwrap();
    let rubrics = write(dir.path(), "rubrics.toml", OVERRIDE_RUBRICS);

    fiteval()
        .args(["score", "--rubric", "sprint_50m", "--value", "7", "--rubrics"])
        .arg(&rubrics)
        .assert()
        .success()
        .stdout(predicate::str::contains("50 m sprint (junior)"))
        .stdout(predicate::str::contains("-> 10/10"));
}

#[test]
fn rubrics_listing() {
    fiteval()
        .arg("rubrics")
        .assert()
        .success()
        .stdout(predicate::str::contains("running_speed"))
        .stdout(predicate::str::contains("Modified back scratch"))
        .stdout(predicate::str::contains("(step)"))
        .stdout(predicate::str::contains("3→4 (up to 3)"))
        .stdout(predicate::str::contains("9→3 (from 3)"));
}

#[test]
fn rubrics_filtered_by_category() {
    fiteval()
        .args(["rubrics", "--category", "speed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sprint_50m"))
        .stdout(predicate::str::contains("push_ups").not());
}

#[test]
fn rubrics_unknown_category() {
    fiteval()
        .args(["rubrics", "--category", "agility"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_rubric_file() {
    let dir = TempDir::new().unwrap();
    let rubrics = write(dir.path(), "rubrics.toml", OVERRIDE_RUBRICS);

    fiteval()
        .arg("validate")
        .arg("--rubrics")
        .arg(&rubrics)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rubric: sprint_50m"))
        .stdout(predicate::str::contains("All rubrics valid"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "extra.toml",
        r#"
[[rubrics]]
id = "shuttle_run"
name = "Shuttle run"
unit = "s"
direction = "lower_is_better"
domain = [0.0, 60.0]
breakpoints = [{ threshold = 9.0, score = 10 }, { threshold = 14.0, score = 0 }]
"#,
    );

    fiteval()
        .arg("validate")
        .arg("--rubrics")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[shuttle_run] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_rejects_non_monotonic_table() {
    let dir = TempDir::new().unwrap();
    let rubrics = write(
        dir.path(),
        "broken.toml",
        r#"
[[rubrics]]
id = "broken"
name = "Broken"
unit = "s"
direction = "lower_is_better"
domain = [0.0, 60.0]
breakpoints = [{ threshold = 10.0, score = 0 }, { threshold = 20.0, score = 10 }]
"#,
    );

    fiteval()
        .arg("validate")
        .arg("--rubrics")
        .arg(&rubrics)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not monotonic"));
}

#[test]
fn validate_nonexistent_file() {
    fiteval()
        .args(["validate", "--rubrics", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn evaluate_full_sheet() {
    let dir = TempDir::new().unwrap();
    let sheet = write(dir.path(), "sheet.toml", FULL_SHEET);
    let output = dir.path().join("out");

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(&output)
        .args(["--format", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall: 85"))
        .stdout(predicate::str::contains("BMI: 22.86 (normal)"))
        .stderr(predicate::str::contains("Results saved to"));

    let files: Vec<_> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 3);
    let json = files
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(summary["overall"], 85);
    assert_eq!(summary["strength"], 100);
    assert_eq!(summary["participant_id"], "ZS24000001");
}

#[test]
fn evaluate_keeps_reports_inside_output_dir() {
    let dir = TempDir::new().unwrap();
    let sheet = write(
        dir.path(),
        "sheet.toml",
        &FULL_SHEET.replace("ZS24000001", "a/../../x"),
    );
    let output = dir.path().join("nested").join("out");

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(&output)
        .args(["--format", "json"])
        .assert()
        .success();

    let files: Vec<_> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("evaluation-a_______x-"), "{name}");

    // an unsanitized id would have resolved to nested/x-<timestamp>.json
    let nested: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(nested, vec![std::ffi::OsString::from("out")]);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(summary["participant_id"], "a/../../x");
}

#[test]
fn evaluate_partial_sheet_has_no_summary() {
    let dir = TempDir::new().unwrap();
    let sheet = write(dir.path(), "sheet.toml", "[speed]\ntime_secs = 8.0\n");
    let output = dir.path().join("out");

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "missing: strength, flexibility, resistance",
        ));

    assert!(!output.exists());
}

#[test]
fn evaluate_rejects_early_stop() {
    let dir = TempDir::new().unwrap();
    let sheet = write(
        dir.path(),
        "sheet.toml",
        &FULL_SHEET.replace("time_secs = 7.0", "time_secs = 4.0"),
    );

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rejected speed"))
        .stderr(predicate::str::contains("1 category result(s) rejected"));
}

#[test]
fn evaluate_forwards_to_memory_sink() {
    let dir = TempDir::new().unwrap();
    let sheet = write(dir.path(), "sheet.toml", FULL_SHEET);
    let config = write(
        dir.path(),
        "fiteval.toml",
        "default_sink = \"offline\"\n\n[sinks.offline]\ntype = \"memory\"\n",
    );

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("Forwarded to memory: 5/5 delivered"));
}

#[test]
fn evaluate_unknown_sink_only_warns() {
    let dir = TempDir::new().unwrap();
    let sheet = write(dir.path(), "sheet.toml", FULL_SHEET);

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(dir.path().join("out"))
        .args(["--sink", "school"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall: 85"))
        .stderr(predicate::str::contains("unknown sink 'school'"));
}

#[test]
fn evaluate_checks_roster() {
    let dir = TempDir::new().unwrap();
    let sheet = write(dir.path(), "sheet.toml", FULL_SHEET);
    let roster = write(
        dir.path(),
        "roster.toml",
        "[[participants]]\nid = \"ZS24000002\"\nname = \"Someone Else\"\n",
    );

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--roster")
        .arg(&roster)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no participant registered as 'ZS24000001'"));
}

#[test]
fn evaluate_appends_history_then_progress() {
    let dir = TempDir::new().unwrap();
    let sheet = write(dir.path(), "sheet.toml", FULL_SHEET);
    let history = dir.path().join("progress.json");
    let html = dir.path().join("progress.html");

    fiteval()
        .arg("evaluate")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--history")
        .arg(&history)
        .assert()
        .success()
        .stderr(predicate::str::contains("History updated"));

    fiteval()
        .arg("progress")
        .arg("--history")
        .arg(&history)
        .arg("--html")
        .arg(&html)
        .assert()
        .success()
        .stdout(predicate::str::contains("Participant: ZS24000001"))
        .stdout(predicate::str::contains("average"));

    assert!(std::fs::read_to_string(&html)
        .unwrap()
        .contains("ZS24000001"));
}

#[test]
fn progress_missing_history() {
    fiteval()
        .args(["progress", "--history", "no_such_history.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn live_flexibility_from_stdin() {
    fiteval()
        .args(["live", "--category", "flexibility"])
        .write_stdin("35\n31\n26,0\n7.5\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[4/4] Modified back scratch"))
        .stdout(predicate::str::contains("flexibility score: 88"));
}

#[test]
fn live_reprompts_after_bad_input() {
    fiteval()
        .args(["live", "--category", "flexibility"])
        .write_stdin("abc\n50\n35\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("not a number"))
        .stdout(predicate::str::contains("Cancelled, nothing recorded."));
}

#[test]
fn bmi_command() {
    fiteval()
        .args(["bmi", "--weight", "70", "--height", "175"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BMI: 22.86 (normal)"));
}

#[test]
fn bmi_rejects_out_of_range() {
    fiteval()
        .args(["bmi", "--weight", "300", "--height", "175"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("weight must be"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    fiteval()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created fiteval.toml"))
        .stdout(predicate::str::contains("Created sheets/example.toml"));

    assert!(dir.path().join("fiteval.toml").exists());
    assert!(dir.path().join("sheets/example.toml").exists());

    // The generated files are usable as-is.
    fiteval()
        .current_dir(dir.path())
        .args(["evaluate", "--sheet", "sheets/example.toml", "--no-forward"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall: 85"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    fiteval()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    fiteval()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    fiteval()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fitness evaluation scoring"));
}

#[test]
fn version_output() {
    fiteval()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fiteval"));
}
