//! Progress history across evaluations and the statistics shown from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Category, EvaluationSummary};
use crate::rubric::overall_score;

/// One day's evaluation scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    pub date: NaiveDate,
    pub strength: u8,
    pub speed: u8,
    pub flexibility: u8,
    pub resistance: u8,
    /// BMI as shown on the summary, empty when unknown.
    #[serde(default)]
    pub bmi: String,
}

impl DailyResult {
    pub fn from_summary(summary: &EvaluationSummary) -> Self {
        Self {
            date: summary.created_at.date_naive(),
            strength: summary.strength,
            speed: summary.speed,
            flexibility: summary.flexibility,
            resistance: summary.resistance,
            bmi: summary.bmi.clone(),
        }
    }

    pub fn score(&self, category: Category) -> u8 {
        match category {
            Category::Strength => self.strength,
            Category::Speed => self.speed,
            Category::Flexibility => self.flexibility,
            Category::Resistance => self.resistance,
        }
    }

    /// Rounded mean of the day's four scores.
    pub fn overall(&self) -> u8 {
        overall_score(&Category::ALL.map(|c| self.score(c)))
    }
}

/// Per-category averages over a history, all 0–100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressAverages {
    pub strength: u8,
    pub speed: u8,
    pub flexibility: u8,
    pub resistance: u8,
    /// Rounded mean of the four category averages.
    pub general: u8,
}

impl ProgressAverages {
    pub fn score(&self, category: Category) -> u8 {
        match category {
            Category::Strength => self.strength,
            Category::Speed => self.speed,
            Category::Flexibility => self.flexibility,
            Category::Resistance => self.resistance,
        }
    }
}

/// A participant's evaluations, one entry per day, sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredHistory")]
pub struct ProgressHistory {
    participant_id: Option<String>,
    entries: Vec<DailyResult>,
}

/// On-disk shape of a history, which may have been edited by hand.
#[derive(Deserialize)]
struct StoredHistory {
    #[serde(default)]
    participant_id: Option<String>,
    #[serde(default)]
    entries: Vec<DailyResult>,
}

impl From<StoredHistory> for ProgressHistory {
    /// Sorts by date; of several entries for one day the last one stays.
    fn from(stored: StoredHistory) -> Self {
        let mut history = Self::new(stored.participant_id);
        for entry in stored.entries {
            history.push(entry);
        }
        history
    }
}

impl ProgressHistory {
    pub fn new(participant_id: Option<String>) -> Self {
        Self {
            participant_id,
            entries: Vec::new(),
        }
    }

    pub fn participant_id(&self) -> Option<&str> {
        self.participant_id.as_deref()
    }

    pub fn entries(&self) -> &[DailyResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a day's result. A later evaluation on the same day replaces the
    /// earlier one.
    pub fn push(&mut self, entry: DailyResult) {
        match self.entries.binary_search_by_key(&entry.date, |e| e.date) {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Add the day's entry for a finished evaluation.
    pub fn record(&mut self, summary: &EvaluationSummary) {
        if self.participant_id.is_none() {
            self.participant_id = summary.participant_id.clone();
        }
        self.push(DailyResult::from_summary(summary));
    }

    /// Rounded averages per category. All zero for an empty history.
    pub fn averages(&self) -> ProgressAverages {
        if self.entries.is_empty() {
            return ProgressAverages::default();
        }
        let avg = |category: Category| {
            let scores: Vec<u8> = self.entries.iter().map(|e| e.score(category)).collect();
            overall_score(&scores)
        };
        let [strength, speed, flexibility, resistance] = Category::ALL.map(avg);
        ProgressAverages {
            strength,
            speed,
            flexibility,
            resistance,
            general: overall_score(&[strength, speed, flexibility, resistance]),
        }
    }

    /// Change in a category's score from the first entry to the last.
    pub fn trend(&self, category: Category) -> i16 {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => {
                i16::from(last.score(category)) - i16::from(first.score(category))
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, scores: [u8; 4]) -> DailyResult {
        DailyResult {
            date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
            strength: scores[0],
            speed: scores[1],
            flexibility: scores[2],
            resistance: scores[3],
            bmi: "22.86".into(),
        }
    }

    #[test]
    fn empty_history_averages_zero() {
        let h = ProgressHistory::default();
        assert_eq!(h.averages(), ProgressAverages::default());
        assert_eq!(h.trend(Category::Speed), 0);
    }

    #[test]
    fn entries_stay_sorted() {
        let mut h = ProgressHistory::new(None);
        h.push(day(10, [50, 50, 50, 50]));
        h.push(day(2, [40, 40, 40, 40]));
        h.push(day(5, [45, 45, 45, 45]));
        let days: Vec<u32> = h
            .entries()
            .iter()
            .map(|e| chrono::Datelike::day(&e.date))
            .collect();
        assert_eq!(days, vec![2, 5, 10]);
    }

    #[test]
    fn same_day_replaces() {
        let mut h = ProgressHistory::new(None);
        h.push(day(1, [10, 10, 10, 10]));
        h.push(day(1, [90, 90, 90, 90]));
        assert_eq!(h.len(), 1);
        assert_eq!(h.entries()[0].strength, 90);
    }

    #[test]
    fn averages_and_general() {
        let mut h = ProgressHistory::new(Some("ZS1".into()));
        h.push(day(1, [80, 60, 70, 90]));
        h.push(day(2, [90, 65, 70, 100]));
        let avg = h.averages();
        assert_eq!(avg.strength, 85);
        // 62.5 rounds half up
        assert_eq!(avg.speed, 63);
        assert_eq!(avg.flexibility, 70);
        assert_eq!(avg.resistance, 95);
        // (85 + 63 + 70 + 95) / 4 = 78.25
        assert_eq!(avg.general, 78);
        assert_eq!(h.trend(Category::Strength), 10);
        assert_eq!(h.entries()[0].overall(), 75);
    }

    #[test]
    fn trend_can_be_negative() {
        let mut h = ProgressHistory::new(None);
        h.push(day(1, [80, 60, 70, 90]));
        h.push(day(9, [70, 60, 70, 90]));
        assert_eq!(h.trend(Category::Strength), -10);
    }

    #[test]
    fn loaded_entries_are_sorted_and_deduplicated() {
        let json = r#"{
            "participant_id": "ZS1",
            "entries": [
                {"date": "2024-03-15", "strength": 90, "speed": 90, "flexibility": 90, "resistance": 90},
                {"date": "2024-03-01", "strength": 10, "speed": 10, "flexibility": 10, "resistance": 10},
                {"date": "2024-03-08", "strength": 40, "speed": 40, "flexibility": 40, "resistance": 40},
                {"date": "2024-03-01", "strength": 20, "speed": 20, "flexibility": 20, "resistance": 20}
            ]
        }"#;
        let mut h: ProgressHistory = serde_json::from_str(json).unwrap();
        let days: Vec<u32> = h
            .entries()
            .iter()
            .map(|e| chrono::Datelike::day(&e.date))
            .collect();
        assert_eq!(days, vec![1, 8, 15]);
        assert_eq!(h.entries()[0].strength, 20);
        assert_eq!(h.trend(Category::Strength), 70);

        h.push(day(8, [50, 50, 50, 50]));
        assert_eq!(h.len(), 3);
        assert_eq!(h.entries()[1].strength, 50);
    }
}
