//! JSON persistence and markdown rendering for summaries and histories.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{Category, EvaluationSummary};
use crate::statistics::ProgressHistory;

fn save_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {what}"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {what} to {}", path.display()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {what} JSON"))
}

impl EvaluationSummary {
    /// Save the summary as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path, "summary")
    }

    /// Load a summary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path, "summary")
    }

    /// Format the summary as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        if let Some(id) = &self.participant_id {
            md.push_str(&format!("**Participant:** {id}\n\n"));
        }
        md.push_str(&format!(
            "**Evaluated:** {}\n\n",
            self.created_at.format("%Y-%m-%d %H:%M UTC")
        ));

        md.push_str("| Category | Raw | Score |\n");
        md.push_str("|----------|-----|-------|\n");
        for category in Category::ALL {
            let raw = self
                .results
                .iter()
                .find(|r| r.category() == category)
                .map(|r| format!("{:.2}", r.raw_value()))
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                category,
                raw,
                self.score(category)
            ));
        }
        md.push_str(&format!("| **Overall** | | **{}** |\n", self.overall));

        if !self.bmi.is_empty() {
            md.push_str(&format!("\n**BMI:** {}", self.bmi));
            if let Some(category) = self.bmi_category {
                md.push_str(&format!(" ({category})"));
            }
            md.push('\n');
        }

        md
    }
}

impl ProgressHistory {
    /// Save the history as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path, "history")
    }

    /// Load a history from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path, "history")
    }

    /// Load a history, or start an empty one if the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_json(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BmiCategory;
    use crate::model::TestResult;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_summary() -> EvaluationSummary {
        EvaluationSummary {
            id: Uuid::new_v4(),
            participant_id: Some("ZS24000001".into()),
            created_at: Utc::now(),
            strength: 80,
            speed: 60,
            flexibility: 70,
            resistance: 90,
            overall: 75,
            bmi: "22.86".into(),
            bmi_category: Some(BmiCategory::Normal),
            results: vec![
                TestResult::new(Category::Strength, 24.0, 80, Utc::now()),
                TestResult::new(Category::Speed, 9.0, 60, Utc::now()),
            ],
        }
    }

    #[test]
    fn json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.json");
        let summary = make_summary();
        summary.save_json(&path).unwrap();
        let loaded = EvaluationSummary::load_json(&path).unwrap();
        assert_eq!(loaded, summary);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let err = EvaluationSummary::load_json(Path::new("/nonexistent/summary.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read summary"));
    }

    #[test]
    fn markdown_output() {
        let md = make_summary().to_markdown();
        assert!(md.contains("**Participant:** ZS24000001"));
        assert!(md.contains("| strength | 24.00 | 80 |"));
        assert!(md.contains("| flexibility | - | 70 |"));
        assert!(md.contains("**75**"));
        assert!(md.contains("**BMI:** 22.86 (normal)"));
    }

    #[test]
    fn history_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let empty = ProgressHistory::load_or_default(&path).unwrap();
        assert!(empty.is_empty());

        let mut history = empty;
        history.record(&make_summary());
        history.save_json(&path).unwrap();

        let loaded = ProgressHistory::load_or_default(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.participant_id(), Some("ZS24000001"));
        assert_eq!(loaded.averages().general, 75);
    }
}
