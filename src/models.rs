use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::grading;

/// Subject keys every record is created with, in column order.
pub const SUBJECTS: [&str; 4] = ["value1", "value2", "value3", "value4"];

pub const MAX_SCORE: u8 = 100;

/// Subject → score mapping. Never empty, every value within `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u8>", into = "BTreeMap<String, u8>")]
pub struct Scores(BTreeMap<String, u8>);

impl Scores {
    pub fn get(&self, subject: &str) -> Option<u8> {
        self.0.get(subject).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(subject, score)| (subject.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn total(&self) -> u32 {
        self.0.values().map(|score| u32::from(*score)).sum()
    }
}

impl TryFrom<BTreeMap<String, u8>> for Scores {
    type Error = ScoreError;

    fn try_from(scores: BTreeMap<String, u8>) -> Result<Self, Self::Error> {
        if scores.is_empty() {
            return Err(ScoreError::Empty);
        }
        if let Some((subject, value)) = scores.iter().find(|(_, value)| **value > MAX_SCORE) {
            return Err(ScoreError::OutOfRange {
                subject: subject.clone(),
                value: *value,
            });
        }
        Ok(Self(scores))
    }
}

impl From<Scores> for BTreeMap<String, u8> {
    fn from(scores: Scores) -> Self {
        scores.0
    }
}

/// A mean score kept in tenths of a point, so `Average::from_tenths(875)` is `87.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Average(u16);

impl Average {
    pub const fn from_tenths(tenths: u16) -> Self {
        Self(tenths)
    }

    /// Mean of `sum / count` in tenths, rounding halves up. `count` must be non-zero.
    pub(crate) fn from_ratio(sum: u64, count: u64) -> Self {
        let tenths = (sum * 20 + count) / (2 * count);
        Self(u16::try_from(tenths).unwrap_or(u16::MAX))
    }

    pub fn tenths(self) -> u16 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    pub fn letter(self) -> LetterGrade {
        grading::letter_grade(self.as_f64())
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        f.write_str(letter)
    }
}

impl FromStr for LetterGrade {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(LetterGrade::A),
            "B" => Ok(LetterGrade::B),
            "C" => Ok(LetterGrade::C),
            "D" => Ok(LetterGrade::D),
            "F" => Ok(LetterGrade::F),
            other => Err(format!("unknown letter grade `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradeFilter {
    #[default]
    All,
    Only(LetterGrade),
}

impl FromStr for GradeFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(GradeFilter::All);
        }
        value.parse().map(GradeFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    #[value(name = "grade-asc", alias = "average-asc")]
    AverageAsc,
    #[value(name = "grade-desc", alias = "average-desc")]
    AverageDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum View {
    #[default]
    Dashboard,
    Students,
    Stats,
    Reports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(rename = "grades")]
    pub scores: Scores,
    #[serde(rename = "addedAt")]
    pub created_at: DateTime<Utc>,
}

/// Persisted shape of a `Record`, checked against the fixed subject columns.
#[derive(Deserialize)]
struct StoredRecord {
    id: String,
    name: String,
    grades: Scores,
    #[serde(rename = "addedAt")]
    added_at: DateTime<Utc>,
}

impl TryFrom<StoredRecord> for Record {
    type Error = ScoreError;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let subjects: Vec<&str> = stored.grades.iter().map(|(subject, _)| subject).collect();
        // BTreeMap keys iterate sorted, and SUBJECTS is sorted too.
        if subjects != SUBJECTS {
            return Err(ScoreError::Subjects {
                expected: SUBJECTS.join(", "),
                found: subjects.join(", "),
            });
        }
        Ok(Self {
            id: stored.id,
            name: stored.name,
            scores: stored.grades,
            created_at: stored.added_at,
        })
    }
}

/// Raw, unvalidated input for a new record.
#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    pub id: String,
    pub name: String,
    pub scores: [String; 4],
}

/// One record as every view shows it: the record plus its derived values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub id: String,
    pub name: String,
    pub scores: Scores,
    pub average: Average,
    pub letter: LetterGrade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub class_average: Option<Average>,
    pub top_performer: Option<String>,
    pub passing_rate: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub top: Vec<RecordRow>,
    pub bottom: Vec<RecordRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Views {
    pub table: Vec<RecordRow>,
    pub cards: Vec<RecordRow>,
    pub stats: Stats,
    pub report: Report,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[(&str, u8)]) -> BTreeMap<String, u8> {
        values
            .iter()
            .map(|(subject, score)| (subject.to_string(), *score))
            .collect()
    }

    #[test]
    fn scores_reject_empty_and_out_of_range() {
        assert_eq!(Scores::try_from(BTreeMap::new()), Err(ScoreError::Empty));
        assert_eq!(
            Scores::try_from(scores(&[("value1", 90), ("value2", 101)])),
            Err(ScoreError::OutOfRange {
                subject: "value2".to_string(),
                value: 101
            })
        );
        assert!(Scores::try_from(scores(&[("value1", 0), ("value2", 100)])).is_ok());
    }

    #[test]
    fn average_displays_one_decimal() {
        assert_eq!(Average::from_tenths(500).to_string(), "50.0");
        assert_eq!(Average::from_tenths(913).to_string(), "91.3");
        assert_eq!(Average::from_tenths(5).to_string(), "0.5");
    }

    #[test]
    fn ratio_rounds_halves_up() {
        assert_eq!(Average::from_ratio(365, 4).tenths(), 913);
        assert_eq!(Average::from_ratio(350, 4).tenths(), 875);
        assert_eq!(Average::from_ratio(200, 3).tenths(), 667);
    }

    #[test]
    fn record_uses_persisted_field_names() {
        let json = r#"{
            "id": "ID-1001",
            "name": "Person 1",
            "grades": { "value1": 92, "value2": 88, "value3": 95, "value4": 90 },
            "addedAt": "2026-01-10T00:00:00.000Z"
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.scores.get("value3"), Some(95));

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("grades").is_some());
        assert!(value.get("addedAt").is_some());
    }

    #[test]
    fn record_with_empty_grades_does_not_parse() {
        let json = r#"{"id":"x","name":"Someone","grades":{},"addedAt":"2026-01-10T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }

    #[test]
    fn record_grades_must_use_fixed_subjects() {
        for grades in [
            r#"{"math":40}"#,
            r#"{"value1":40,"value2":50,"value3":60}"#,
            r#"{"value1":40,"value2":50,"value3":60,"value4":70,"value5":80}"#,
        ] {
            let json = format!(
                r#"{{"id":"x","name":"Someone","grades":{grades},"addedAt":"2026-01-10T00:00:00Z"}}"#
            );
            let err = serde_json::from_str::<Record>(&json).unwrap_err();
            assert!(err.to_string().contains("stored grades must be exactly"), "{grades}: {err}");
        }

        // Generic score maps are still fine outside of a stored record.
        let scores: Scores = serde_json::from_str(r#"{"math":40}"#).unwrap();
        assert_eq!(scores.get("math"), Some(40));
    }

    #[test]
    fn grade_filter_parses_sentinel_and_letters() {
        assert_eq!("all".parse::<GradeFilter>(), Ok(GradeFilter::All));
        assert_eq!("b".parse::<GradeFilter>(), Ok(GradeFilter::Only(LetterGrade::B)));
        assert!("E".parse::<GradeFilter>().is_err());
    }
}
