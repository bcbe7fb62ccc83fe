use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn coefficient(self) -> f64 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = PlannerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(PlannerError::InvalidCatalogEntry(format!(
                "unknown difficulty tier '{value}'"
            ))),
        }
    }
}

/// Grouping used to pick time-of-day slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hard,
    Medium,
    Easy,
    Language,
    Rote,
}

impl Category {
    /// Cycling order used by the schedule builder.
    pub const ORDER: [Category; 5] = [
        Category::Hard,
        Category::Medium,
        Category::Easy,
        Category::Language,
        Category::Rote,
    ];

    pub fn index(self) -> usize {
        match self {
            Category::Hard => 0,
            Category::Medium => 1,
            Category::Easy => 2,
            Category::Language => 3,
            Category::Rote => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Hard => "Hard",
            Category::Medium => "Medium",
            Category::Easy => "Easy",
            Category::Language => "Language",
            Category::Rote => "Rote",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PlannerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(Category::Hard),
            "medium" => Ok(Category::Medium),
            "easy" => Ok(Category::Easy),
            "language" | "language-skills" => Ok(Category::Language),
            "rote" | "rote-memorization" => Ok(Category::Rote),
            _ => Err(PlannerError::InvalidCatalogEntry(format!(
                "unknown category '{value}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub subject: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub expected_questions: u32,
    pub category: Category,
}

/// Answer counts for one topic.
///
/// `correct + incorrect + blank == actual_questions` holds for every value
/// built through [`PerformanceEntry::new`] or [`PerformanceEntry::from_counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerformanceEntry {
    pub correct: u32,
    pub incorrect: u32,
    pub blank: u32,
    pub actual_questions: u32,
}

impl PerformanceEntry {
    /// Derives `blank` from the actual question count.
    pub fn new(correct: i64, incorrect: i64, actual_questions: i64) -> Result<Self> {
        let correct = non_negative("correct", correct)?;
        let incorrect = non_negative("incorrect", incorrect)?;
        let actual_questions = non_negative("actual question count", actual_questions)?;

        let answered = correct.checked_add(incorrect).ok_or_else(|| {
            PlannerError::InvalidInput("answer counts overflow".to_string())
        })?;
        if answered > actual_questions {
            return Err(PlannerError::InvalidInput(format!(
                "correct ({correct}) + incorrect ({incorrect}) exceeds actual question count ({actual_questions})"
            )));
        }

        Ok(Self {
            correct,
            incorrect,
            blank: actual_questions - answered,
            actual_questions,
        })
    }

    /// Builds an entry whose actual question count is the sum of the three counts.
    pub fn from_counts(correct: i64, incorrect: i64, blank: i64) -> Result<Self> {
        let blank = non_negative("blank", blank)?;
        let correct_count = non_negative("correct", correct)?;
        let incorrect_count = non_negative("incorrect", incorrect)?;
        let total = i64::from(correct_count) + i64::from(incorrect_count) + i64::from(blank);
        Self::new(correct, incorrect, total)
    }

    pub fn attempted(&self) -> u32 {
        self.correct + self.incorrect + self.blank
    }

    /// Four-option negative marking: every four wrong answers cancel one right one.
    pub fn net_score(&self) -> f64 {
        self.correct as f64 - self.incorrect as f64 / 4.0
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(PlannerError::InvalidInput(format!(
            "{field} must not be negative (got {value})"
        )));
    }
    u32::try_from(value)
        .map_err(|_| PlannerError::InvalidInput(format!("{field} is too large (got {value})")))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTopic {
    pub subject: String,
    pub topic: String,
    pub priority_score: f64,
    pub correct: u32,
    pub incorrect: u32,
    pub blank: u32,
    pub actual_questions: u32,
    pub difficulty: Difficulty,
    pub category: Category,
    pub expected_questions: u32,
}

impl ScoredTopic {
    pub fn label(&self) -> String {
        format!("{} - {}", self.subject, self.topic)
    }

    pub fn attempted(&self) -> u32 {
        self.correct + self.incorrect + self.blank
    }
}

/// A `HH:MM-HH:MM` clock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(PlannerError::InvalidInput(format!(
                "time window must start before it ends ({} >= {})",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

impl FromStr for TimeWindow {
    type Err = PlannerError;

    fn from_str(value: &str) -> Result<Self> {
        let (start, end) = value.trim().split_once('-').ok_or_else(|| {
            PlannerError::InvalidInput(format!("time window '{value}' is not HH:MM-HH:MM"))
        })?;
        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M").map_err(|err| {
                PlannerError::InvalidInput(format!("time window '{value}': {err}"))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeWindow> for String {
    fn from(window: TimeWindow) -> Self {
        window.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    /// 1-based day number.
    pub day: u32,
    pub date: NaiveDate,
    pub time_slot: Option<TimeWindow>,
    pub subject: String,
    pub topic: String,
    pub priority_score: f64,
    pub difficulty: Difficulty,
    pub category: Category,
    pub correct: u32,
    pub incorrect: u32,
    pub blank: u32,
}

impl ScheduleEntry {
    pub fn date_label(&self) -> String {
        self.date.format("%d.%m.%Y").to_string()
    }

    pub fn slot_label(&self) -> String {
        self.time_slot.map(|slot| slot.to_string()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAggregate {
    pub subject: String,
    pub topic_count: usize,
    pub total_score: f64,
    pub mean_score: f64,
    pub weak_topics: usize,
    pub weak_ratio: f64,
    /// Summed over the subject's topics, so wider than the per-topic counts.
    pub correct: u64,
    pub incorrect: u64,
    pub blank: u64,
    pub net_score: f64,
    pub success_rate: f64,
    pub tier: Difficulty,
}
