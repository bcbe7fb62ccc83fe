//! File serialisations of the analysis and the schedule.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{PlannerError, Result};
use crate::models::{Difficulty, ScheduleEntry, ScoredTopic};

const SCHEDULE_COLUMNS: [&str; 12] = [
    "Day",
    "Date",
    "Time",
    "Subject",
    "Topic",
    "Priority",
    "Difficulty",
    "Category",
    "Correct",
    "Incorrect",
    "Blank",
    "Highlight",
];

#[derive(Serialize)]
struct ScheduleRow<'a> {
    #[serde(rename = "Day")]
    day: u32,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "Topic")]
    topic: &'a str,
    #[serde(rename = "Priority")]
    priority: String,
    #[serde(rename = "Difficulty")]
    difficulty: &'static str,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "Correct")]
    correct: u32,
    #[serde(rename = "Incorrect")]
    incorrect: u32,
    #[serde(rename = "Blank")]
    blank: u32,
    #[serde(rename = "Highlight")]
    highlight: String,
}

/// Marks rows a spreadsheet would colour: high priority and hard topics.
pub fn highlight_for(entry: &ScheduleEntry, high_priority: f64) -> String {
    let mut flags = Vec::new();
    if entry.priority_score > high_priority {
        flags.push("high-priority");
    }
    if entry.difficulty == Difficulty::Hard {
        flags.push("hard");
    }
    flags.join(";")
}

pub fn write_schedule_csv<W: Write>(
    writer: W,
    entries: &[ScheduleEntry],
    high_priority: f64,
) -> std::result::Result<(), csv::Error> {
    // Header written up front so an empty schedule keeps the column layout.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(SCHEDULE_COLUMNS)?;
    for entry in entries {
        writer.serialize(ScheduleRow {
            day: entry.day,
            date: entry.date_label(),
            time: entry.slot_label(),
            subject: &entry.subject,
            topic: &entry.topic,
            priority: format!("{:.2}", entry.priority_score),
            difficulty: entry.difficulty.as_str(),
            category: entry.category.as_str(),
            correct: entry.correct,
            incorrect: entry.incorrect,
            blank: entry.blank,
            highlight: highlight_for(entry, high_priority),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_schedule(path: &Path, entries: &[ScheduleEntry], high_priority: f64) -> Result<()> {
    let target = path.display().to_string();
    let file = std::fs::File::create(path).map_err(|err| PlannerError::export(&target, err))?;
    write_schedule_csv(file, entries, high_priority)
        .map_err(|err| PlannerError::export(&target, err))?;
    tracing::info!(path = %target, rows = entries.len(), "exported schedule");
    Ok(())
}

/// Analysis keyed by `"subject - topic"`.
pub fn analysis_by_label(scored: &[ScoredTopic]) -> BTreeMap<String, &ScoredTopic> {
    scored.iter().map(|topic| (topic.label(), topic)).collect()
}

pub fn export_analysis(path: &Path, scored: &[ScoredTopic]) -> Result<()> {
    let target = path.display().to_string();
    let json = serde_json::to_string_pretty(&analysis_by_label(scored))
        .map_err(|err| PlannerError::export(&target, err))?;
    std::fs::write(path, json).map_err(|err| PlannerError::export(&target, err))?;
    tracing::info!(path = %target, topics = scored.len(), "exported analysis");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    fn entry(score: f64, difficulty: Difficulty) -> ScheduleEntry {
        ScheduleEntry {
            day: 2,
            date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            time_slot: Some("08:00-10:30".parse().unwrap()),
            subject: "Mathematics".to_string(),
            topic: "Problems".to_string(),
            priority_score: score,
            difficulty,
            category: Category::Hard,
            correct: 2,
            incorrect: 4,
            blank: 3,
        }
    }

    #[test]
    fn csv_has_fixed_header_and_highlights() {
        let mut buffer = Vec::new();
        write_schedule_csv(
            &mut buffer,
            &[entry(18.5, Difficulty::Hard), entry(1.0, Difficulty::Easy)],
            5.0,
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Day,Date,Time,Subject,Topic,Priority,Difficulty,Category,Correct,Incorrect,Blank,Highlight"
        );
        assert_eq!(
            lines[1],
            "2,03.02.2026,08:00-10:30,Mathematics,Problems,18.50,Hard,Hard,2,4,3,high-priority;hard"
        );
        assert!(lines[2].ends_with(",Easy,Hard,2,4,3,"));
    }

    #[test]
    fn empty_schedule_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.csv");
        export_schedule(&path, &[], 5.0).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{}\n", SCHEDULE_COLUMNS.join(",")));
    }

    #[test]
    fn export_to_missing_directory_is_an_export_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plan.csv");
        let result = export_schedule(&path, &[entry(1.0, Difficulty::Easy)], 5.0);
        assert!(matches!(result, Err(PlannerError::ExportFailure { .. })));
    }

    #[test]
    fn analysis_json_is_keyed_by_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        let topic = ScoredTopic {
            subject: "Math".to_string(),
            topic: "Problems".to_string(),
            priority_score: 185.0,
            correct: 2,
            incorrect: 4,
            blank: 3,
            actual_questions: 9,
            difficulty: Difficulty::Hard,
            category: Category::Hard,
            expected_questions: 9,
        };
        export_analysis(&path, &[topic]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["Math - Problems"]["priority_score"], 185.0);
        assert_eq!(value["Math - Problems"]["difficulty"], "hard");
    }
}
