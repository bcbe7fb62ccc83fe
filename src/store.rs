//! Caller-owned performance state for one planning session.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::catalog::TopicCatalog;
use crate::error::{PlannerError, Result};
use crate::models::PerformanceEntry;

type TopicKey = (String, String);

#[derive(Debug, Clone, Default)]
pub struct PerformanceStore {
    entries: HashMap<TopicKey, PerformanceEntry>,
}

/// Counts as they arrive from JSON input or an extraction response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCounts {
    pub correct: i64,
    pub incorrect: i64,
    #[serde(default)]
    pub blank: Option<i64>,
    #[serde(default, alias = "actualQuestionCount", alias = "actual_questions")]
    pub actual: Option<i64>,
}

impl RawCounts {
    /// An explicit actual count wins and `blank` is re-derived from it.
    /// Without one, `fallback_actual` is used, then the sum of the counts.
    pub fn into_entry(self, fallback_actual: Option<u32>) -> Result<PerformanceEntry> {
        match (self.actual, self.blank, fallback_actual) {
            (Some(actual), _, _) => PerformanceEntry::new(self.correct, self.incorrect, actual),
            (None, Some(blank), _) => {
                PerformanceEntry::from_counts(self.correct, self.incorrect, blank)
            }
            (None, None, Some(actual)) => {
                PerformanceEntry::new(self.correct, self.incorrect, i64::from(actual))
            }
            (None, None, None) => PerformanceEntry::from_counts(self.correct, self.incorrect, 0),
        }
    }
}

/// `{subject: {topic: counts}}`
pub type RawPerformance = BTreeMap<String, BTreeMap<String, RawCounts>>;

impl PerformanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: &str, topic: &str) -> Option<&PerformanceEntry> {
        self.entries.get(&(subject.to_string(), topic.to_string()))
    }

    pub fn set(&mut self, subject: &str, topic: &str, entry: PerformanceEntry) {
        self.entries
            .insert((subject.to_string(), topic.to_string()), entry);
    }

    /// Validates the counts and derives the blank count before storing.
    pub fn record(
        &mut self,
        subject: &str,
        topic: &str,
        correct: i64,
        incorrect: i64,
        actual_questions: i64,
    ) -> Result<PerformanceEntry> {
        let entry = PerformanceEntry::new(correct, incorrect, actual_questions)?;
        self.set(subject, topic, entry);
        Ok(entry)
    }

    pub fn remove(&mut self, subject: &str, topic: &str) -> Option<PerformanceEntry> {
        self.entries.remove(&(subject.to_string(), topic.to_string()))
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Entries from `other` replace existing ones with the same key.
    pub fn merge(&mut self, other: PerformanceStore) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &PerformanceEntry)> {
        self.entries
            .iter()
            .map(|((subject, topic), entry)| (subject.as_str(), topic.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fails on the first entry whose subject or topic the catalog does not know.
    pub fn validate(&self, catalog: &TopicCatalog) -> Result<()> {
        let mut keys: Vec<&TopicKey> = self.entries.keys().collect();
        keys.sort();
        for (subject, topic) in keys {
            catalog.lookup(subject, topic)?;
        }
        Ok(())
    }

    /// Reads `subject,topic,correct,incorrect[,actual]` rows. A missing actual
    /// count falls back to the catalog's expected count for the topic.
    pub fn from_csv_path(path: &Path, catalog: &TopicCatalog) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|err| {
            PlannerError::InvalidInput(format!("cannot open {}: {err}", path.display()))
        })?;
        let store = Self::from_csv_reader(file, catalog)?;
        tracing::info!(path = %path.display(), entries = store.len(), "loaded performance data");
        Ok(store)
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R, catalog: &TopicCatalog) -> Result<Self> {
        #[derive(Deserialize)]
        struct CsvRow {
            subject: String,
            topic: String,
            correct: i64,
            incorrect: i64,
            #[serde(default)]
            actual: Option<i64>,
        }

        let mut reader = csv::Reader::from_reader(reader);
        let mut store = Self::new();

        for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|err| PlannerError::InvalidInput(err.to_string()))?;
            let subject = row.subject.trim();
            let topic = catalog.lookup(subject, row.topic.trim())?;
            let actual = row
                .actual
                .unwrap_or_else(|| i64::from(topic.expected_questions));
            store
                .record(&topic.subject, &topic.name, row.correct, row.incorrect, actual)
                .map_err(|err| match err {
                    PlannerError::InvalidInput(message) => {
                        PlannerError::InvalidInput(format!("row {}: {message}", line + 1))
                    }
                    other => other,
                })?;
        }

        Ok(store)
    }

    /// Strict JSON import: every subject/topic must exist in the catalog.
    pub fn from_json_str(json: &str, catalog: &TopicCatalog) -> Result<Self> {
        let raw: RawPerformance = serde_json::from_str(json)
            .map_err(|err| PlannerError::InvalidInput(format!("performance JSON: {err}")))?;

        let mut store = Self::new();
        for (subject, topics) in raw {
            for (topic_name, counts) in topics {
                let topic = catalog.lookup(&subject, &topic_name)?;
                let entry = counts.into_entry(None)?;
                store.set(&topic.subject, &topic.name, entry);
            }
        }
        Ok(store)
    }

    /// Serialises in the shape [`PerformanceStore::from_json_str`] reads,
    /// subjects and topics in catalog order.
    pub fn to_json(&self, catalog: &TopicCatalog) -> Result<String> {
        let mut document = serde_json::Map::new();
        for topic in catalog.topics() {
            let Some(entry) = self.get(&topic.subject, &topic.name) else {
                continue;
            };
            let subject = document
                .entry(topic.subject.clone())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if let serde_json::Value::Object(topics) = subject {
                topics.insert(
                    topic.name.clone(),
                    serde_json::json!({
                        "correct": entry.correct,
                        "incorrect": entry.incorrect,
                        "blank": entry.blank,
                        "actual": entry.actual_questions,
                    }),
                );
            }
        }
        serde_json::to_string_pretty(&serde_json::Value::Object(document))
            .map_err(|err| PlannerError::export("performance JSON", err))
    }

    /// Lenient import for machine-extracted data: topics the catalog does not
    /// know, and rows with unusable counts, are skipped with a warning.
    pub fn from_raw_lenient(raw: RawPerformance, catalog: &TopicCatalog) -> Self {
        let mut store = Self::new();
        for (subject, topics) in raw {
            for (topic_name, counts) in topics {
                let Some(topic) = catalog.get(&subject, &topic_name) else {
                    tracing::warn!(%subject, topic = %topic_name, "skipping topic missing from catalog");
                    continue;
                };
                match counts.into_entry(Some(topic.expected_questions)) {
                    Ok(entry) => store.set(&topic.subject, &topic.name, entry),
                    Err(err) => {
                        tracing::warn!(%subject, topic = %topic_name, error = %err, "skipping invalid counts");
                    }
                }
            }
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TopicCatalog {
        TopicCatalog::builtin().unwrap()
    }

    #[test]
    fn record_get_reset() {
        let mut store = PerformanceStore::new();
        let entry = store.record("Mathematics", "Problems", 2, 4, 9).unwrap();
        assert_eq!(entry.blank, 3);
        assert_eq!(store.get("Mathematics", "Problems"), Some(&entry));

        store.reset();
        assert!(store.is_empty());
        assert!(store.get("Mathematics", "Problems").is_none());
    }

    #[test]
    fn remove_and_iter_reflect_current_entries() {
        let mut store = PerformanceStore::new();
        store.record("Mathematics", "Problems", 2, 4, 9).unwrap();
        store.record("Geometry", "Triangles", 1, 0, 3).unwrap();

        let removed = store.remove("Geometry", "Triangles").unwrap();
        assert_eq!(removed.blank, 2);
        assert!(store.remove("Geometry", "Triangles").is_none());

        let entries: Vec<(&str, &str, u32)> = store
            .iter()
            .map(|(subject, topic, entry)| (subject, topic, entry.incorrect))
            .collect();
        assert_eq!(entries, vec![("Mathematics", "Problems", 4)]);
    }

    #[test]
    fn record_rejects_counts_above_actual() {
        let mut store = PerformanceStore::new();
        assert!(matches!(
            store.record("Mathematics", "Problems", 5, 5, 9),
            Err(PlannerError::InvalidInput(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn validate_flags_unknown_topics() {
        let mut store = PerformanceStore::new();
        store.record("Mathematics", "Problems", 1, 1, 9).unwrap();
        assert!(store.validate(&catalog()).is_ok());

        store.record("Mathematics", "Topology", 1, 1, 2).unwrap();
        assert!(matches!(
            store.validate(&catalog()),
            Err(PlannerError::InvalidCatalogEntry(_))
        ));
    }

    #[test]
    fn merge_overwrites_existing_keys() {
        let mut first = PerformanceStore::new();
        first.record("Physics", "Optics and Waves", 0, 1, 1).unwrap();
        first.record("Geometry", "Triangles", 1, 0, 3).unwrap();

        let mut second = PerformanceStore::new();
        second.record("Physics", "Optics and Waves", 1, 0, 1).unwrap();

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.get("Physics", "Optics and Waves").unwrap().correct, 1);
    }

    #[test]
    fn csv_defaults_actual_to_expected_count() {
        let data = "subject,topic,correct,incorrect,actual\n\
                    Mathematics,Problems,3,2,\n\
                    Geometry,Triangles,1,1,4\n";
        let store = PerformanceStore::from_csv_reader(data.as_bytes(), &catalog()).unwrap();
        let problems = store.get("Mathematics", "Problems").unwrap();
        assert_eq!(problems.actual_questions, 9);
        assert_eq!(problems.blank, 4);
        assert_eq!(store.get("Geometry", "Triangles").unwrap().blank, 2);
    }

    #[test]
    fn csv_with_unknown_topic_fails_fast() {
        let data = "subject,topic,correct,incorrect,actual\n\
                    Mathematics,Calculus,3,2,5\n";
        assert!(matches!(
            PerformanceStore::from_csv_reader(data.as_bytes(), &catalog()),
            Err(PlannerError::InvalidCatalogEntry(_))
        ));
    }

    #[test]
    fn json_import_accepts_blank_or_actual() {
        let json = r#"{
            "Mathematics": {
                "Problems": {"correct": 2, "incorrect": 4, "actualQuestionCount": 9},
                "Functions": {"correct": 1, "incorrect": 0, "blank": 1}
            }
        }"#;
        let store = PerformanceStore::from_json_str(json, &catalog()).unwrap();
        assert_eq!(store.get("Mathematics", "Problems").unwrap().blank, 3);
        assert_eq!(store.get("Mathematics", "Functions").unwrap().actual_questions, 2);
    }

    #[test]
    fn json_output_reads_back() {
        let mut store = PerformanceStore::new();
        store.record("Mathematics", "Problems", 2, 4, 9).unwrap();
        store.record("Turkish", "Grammar", 3, 0, 6).unwrap();

        let json = store.to_json(&catalog()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Mathematics"]["Problems"]["blank"], 3);

        let restored = PerformanceStore::from_json_str(&json, &catalog()).unwrap();
        assert_eq!(restored.get("Turkish", "Grammar"), store.get("Turkish", "Grammar"));
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn lenient_import_skips_unknown_and_invalid_rows() {
        let json = r#"{
            "Mathematics": {
                "Problems": {"correct": 2, "incorrect": 4},
                "Calculus": {"correct": 1, "incorrect": 1},
                "Functions": {"correct": -3, "incorrect": 0}
            },
            "Astronomy": {"Stars": {"correct": 1, "incorrect": 1}}
        }"#;
        let raw: RawPerformance = serde_json::from_str(json).unwrap();
        let store = PerformanceStore::from_raw_lenient(raw, &catalog());
        assert_eq!(store.len(), 1);
        let problems = store.get("Mathematics", "Problems").unwrap();
        assert_eq!(problems.actual_questions, 9);
        assert_eq!(problems.blank, 3);
    }
}
