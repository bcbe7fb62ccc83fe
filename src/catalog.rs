//! Reference data: subjects, topics, difficulty tiers and expected question counts.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{PlannerError, Result};
use crate::models::{Category, Difficulty, Topic};

use crate::models::Category as C;
use crate::models::Difficulty as D;

/// General-ability exam catalog.
const BUILTIN: &[(&str, &str, Difficulty, u32, Category)] = &[
    ("Turkish", "Paragraph Comprehension", D::Hard, 23, C::Language),
    ("Turkish", "Sentence Meaning", D::Medium, 3, C::Language),
    ("Turkish", "Word Meaning", D::Easy, 2, C::Language),
    ("Turkish", "Expression Errors", D::Medium, 2, C::Language),
    ("Turkish", "Spelling Rules", D::Easy, 1, C::Rote),
    ("Turkish", "Punctuation", D::Easy, 1, C::Rote),
    ("Turkish", "Grammar", D::Medium, 6, C::Rote),
    ("Turkish", "Verbal Logic", D::Hard, 2, C::Hard),
    ("Mathematics", "Basic Concepts", D::Easy, 2, C::Hard),
    ("Mathematics", "Digits", D::Easy, 1, C::Hard),
    ("Mathematics", "Division and Divisibility", D::Easy, 1, C::Hard),
    ("Mathematics", "GCD and LCM", D::Medium, 1, C::Hard),
    ("Mathematics", "Rational, Radical and Exponential Numbers", D::Medium, 4, C::Hard),
    ("Mathematics", "Solving Equations", D::Medium, 3, C::Hard),
    ("Mathematics", "Ratio and Proportion", D::Easy, 2, C::Hard),
    ("Mathematics", "Problems", D::Hard, 9, C::Hard),
    ("Mathematics", "Sets and Logic", D::Medium, 3, C::Hard),
    ("Mathematics", "Functions", D::Medium, 2, C::Hard),
    ("Mathematics", "Permutation, Combination and Probability", D::Hard, 3, C::Hard),
    ("Mathematics", "Data and Graphs", D::Easy, 1, C::Hard),
    ("Geometry", "Basic Concepts and Angles", D::Easy, 1, C::Hard),
    ("Geometry", "Triangles", D::Medium, 3, C::Hard),
    ("Geometry", "Polygons and Quadrilaterals", D::Medium, 2, C::Hard),
    ("Geometry", "Circles and Discs", D::Hard, 2, C::Hard),
    ("Geometry", "Analytic Geometry", D::Hard, 1, C::Hard),
    ("Geometry", "Solids", D::Medium, 1, C::Hard),
    ("Physics", "Introduction to Physics", D::Easy, 1, C::Hard),
    ("Physics", "Force and Motion", D::Medium, 2, C::Hard),
    ("Physics", "Energy, Work and Power", D::Medium, 1, C::Hard),
    ("Physics", "Pressure and Buoyancy", D::Hard, 1, C::Hard),
    ("Physics", "Electricity and Magnetism", D::Hard, 1, C::Hard),
    ("Physics", "Optics and Waves", D::Hard, 1, C::Hard),
    ("Chemistry", "Science of Chemistry and the Atom", D::Easy, 1, C::Medium),
    ("Chemistry", "Periodic Table and Compounds", D::Medium, 2, C::Medium),
    ("Chemistry", "Chemical Species and Interactions", D::Medium, 1, C::Medium),
    ("Chemistry", "Mixtures, Acids, Bases and Salts", D::Medium, 1, C::Medium),
    ("Chemistry", "Chemical Calculations", D::Hard, 2, C::Medium),
    ("Biology", "Building Blocks of Life", D::Easy, 1, C::Medium),
    ("Biology", "Cells and Organelles", D::Medium, 1, C::Medium),
    ("Biology", "Membrane Transport", D::Hard, 1, C::Medium),
    ("Biology", "Classification and Systems", D::Medium, 2, C::Medium),
    ("Biology", "Ecosystems and Matter Cycles", D::Medium, 1, C::Medium),
    ("History", "Ancient and Medieval Civilizations", D::Medium, 1, C::Easy),
    ("History", "Ottoman History", D::Medium, 1, C::Easy),
    ("History", "War of Independence and Ataturk's Principles", D::Hard, 2, C::Easy),
    ("History", "Contemporary Turkey and Reforms", D::Medium, 1, C::Easy),
    ("Geography", "Map Skills", D::Easy, 1, C::Easy),
    ("Geography", "Climate and Landforms", D::Medium, 2, C::Easy),
    ("Geography", "Human and Economic Geography", D::Medium, 2, C::Easy),
    ("Philosophy", "Knowledge, Being and Ethics", D::Hard, 3, C::Easy),
    ("Philosophy", "Politics, Religion and Art", D::Hard, 2, C::Easy),
    ("Religious Culture", "Belief, Worship and Ethics", D::Easy, 3, C::Easy),
    ("Religious Culture", "The Prophet and Islamic Thought", D::Medium, 2, C::Easy),
];

#[derive(Debug, Clone)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
    index: HashMap<(String, String), usize>,
}

impl TopicCatalog {
    pub fn builtin() -> Result<Self> {
        let topics = BUILTIN
            .iter()
            .map(|&(subject, name, difficulty, expected_questions, category)| Topic {
                subject: subject.to_string(),
                name: name.to_string(),
                difficulty,
                expected_questions,
                category,
            })
            .collect();
        Self::from_topics(topics)
    }

    /// Validates and indexes a list of topics, keeping their order.
    pub fn from_topics(topics: Vec<Topic>) -> Result<Self> {
        let mut index = HashMap::with_capacity(topics.len());

        for (position, topic) in topics.iter().enumerate() {
            if topic.subject.trim().is_empty() || topic.name.trim().is_empty() {
                return Err(PlannerError::InvalidCatalogEntry(format!(
                    "row {} has an empty subject or topic name",
                    position + 1
                )));
            }
            if topic.expected_questions == 0 {
                return Err(PlannerError::InvalidCatalogEntry(format!(
                    "{} - {} must expect at least one question",
                    topic.subject, topic.name
                )));
            }
            let key = (topic.subject.clone(), topic.name.clone());
            if index.insert(key, position).is_some() {
                return Err(PlannerError::InvalidCatalogEntry(format!(
                    "duplicate topic {} - {}",
                    topic.subject, topic.name
                )));
            }
        }

        Ok(Self { topics, index })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|err| {
            PlannerError::InvalidCatalogEntry(format!("cannot open {}: {err}", path.display()))
        })?;
        let catalog = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), topics = catalog.len(), "loaded topic catalog");
        Ok(catalog)
    }

    /// Reads `subject,topic,difficulty,expected_questions,category` rows.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct CsvRow {
            subject: String,
            topic: String,
            difficulty: String,
            expected_questions: u32,
            category: String,
        }

        let mut reader = csv::Reader::from_reader(reader);
        let mut topics = Vec::new();

        for result in reader.deserialize::<CsvRow>() {
            let row = result.map_err(|err| PlannerError::InvalidCatalogEntry(err.to_string()))?;
            topics.push(Topic {
                difficulty: row.difficulty.parse()?,
                category: row.category.parse()?,
                subject: row.subject.trim().to_string(),
                name: row.topic.trim().to_string(),
                expected_questions: row.expected_questions,
            });
        }

        Self::from_topics(topics)
    }

    pub fn get(&self, subject: &str, topic: &str) -> Option<&Topic> {
        self.index
            .get(&(subject.to_string(), topic.to_string()))
            .map(|&position| &self.topics[position])
    }

    pub fn lookup(&self, subject: &str, topic: &str) -> Result<&Topic> {
        self.get(subject, topic).ok_or_else(|| {
            PlannerError::InvalidCatalogEntry(format!("{subject} - {topic} is not in the catalog"))
        })
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Subject names in first-seen order.
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = Vec::new();
        for topic in &self.topics {
            if !subjects.contains(&topic.subject.as_str()) {
                subjects.push(&topic.subject);
            }
        }
        subjects
    }

    pub fn total_expected_questions(&self) -> u32 {
        self.topics.iter().map(|topic| topic.expected_questions).sum()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
