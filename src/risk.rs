use serde::{Deserialize, Serialize};

use crate::catalog::TopicCatalog;
use crate::error::Result;
use crate::models::{Difficulty, ScoredTopic};
use crate::store::PerformanceStore;

/// Maps a topic's answer counts to a priority score. Higher means study sooner.
pub trait PriorityFormula {
    fn name(&self) -> &'static str;

    fn score(
        &self,
        correct: u32,
        incorrect: u32,
        blank: u32,
        difficulty: Difficulty,
        expected_questions: u32,
    ) -> f64;
}

/// Weighs each topic by its share of the catalog's expected questions.
#[derive(Debug, Clone, Copy)]
pub struct LinearFormula {
    catalog_total: u32,
}

impl LinearFormula {
    pub fn new(catalog_total: u32) -> Self {
        Self { catalog_total }
    }

    pub fn for_catalog(catalog: &TopicCatalog) -> Self {
        Self::new(catalog.total_expected_questions())
    }
}

impl PriorityFormula for LinearFormula {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn score(
        &self,
        _correct: u32,
        incorrect: u32,
        blank: u32,
        difficulty: Difficulty,
        expected_questions: u32,
    ) -> f64 {
        let base =
            incorrect as f64 * 2.0 + blank as f64 * 1.5 + difficulty.coefficient() * 3.0;
        if expected_questions == 0 || self.catalog_total == 0 {
            return base;
        }
        let weight = expected_questions as f64 / self.catalog_total as f64 * 10.0;
        base * weight
    }
}

/// Dampens high-frequency topics with `ln(1 + expected)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogarithmicFormula;

impl PriorityFormula for LogarithmicFormula {
    fn name(&self) -> &'static str {
        "logarithmic"
    }

    fn score(
        &self,
        _correct: u32,
        incorrect: u32,
        blank: u32,
        difficulty: Difficulty,
        expected_questions: u32,
    ) -> f64 {
        let base = (incorrect as f64 + blank as f64) * 1.2 + difficulty.coefficient() * 3.0;
        if expected_questions == 0 {
            return base;
        }
        let weight = (expected_questions as f64).ln_1p() * 3.0;
        base * weight
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FormulaKind {
    #[default]
    Linear,
    Logarithmic,
}

impl FormulaKind {
    pub fn build(self, catalog: &TopicCatalog) -> Box<dyn PriorityFormula> {
        match self {
            FormulaKind::Linear => Box::new(LinearFormula::for_catalog(catalog)),
            FormulaKind::Logarithmic => Box::new(LogarithmicFormula),
        }
    }
}

/// Scores every stored topic, in catalog order. Fails before scoring anything
/// if the store references a topic the catalog does not contain.
pub fn analyze(
    catalog: &TopicCatalog,
    store: &PerformanceStore,
    formula: &dyn PriorityFormula,
) -> Result<Vec<ScoredTopic>> {
    store.validate(catalog)?;

    let scored: Vec<ScoredTopic> = catalog
        .topics()
        .iter()
        .filter_map(|topic| {
            let entry = store.get(&topic.subject, &topic.name)?;
            Some(ScoredTopic {
                subject: topic.subject.clone(),
                topic: topic.name.clone(),
                priority_score: formula.score(
                    entry.correct,
                    entry.incorrect,
                    entry.blank,
                    topic.difficulty,
                    topic.expected_questions,
                ),
                correct: entry.correct,
                incorrect: entry.incorrect,
                blank: entry.blank,
                actual_questions: entry.actual_questions,
                difficulty: topic.difficulty,
                category: topic.category,
                expected_questions: topic.expected_questions,
            })
        })
        .collect();

    tracing::debug!(formula = formula.name(), topics = scored.len(), "scored topics");
    Ok(scored)
}

/// Drops never-attempted topics and orders the rest by score, highest first.
/// Equal scores keep their input order.
pub fn rank(scored: Vec<ScoredTopic>) -> Vec<ScoredTopic> {
    let mut ranked: Vec<ScoredTopic> = scored
        .into_iter()
        .filter(|topic| topic.attempted() > 0)
        .collect();
    ranked.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    ranked
}
