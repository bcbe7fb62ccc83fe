use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Difficulty, ScoredTopic, SubjectAggregate};

/// Tuning constants for subject classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Mean score at or above which a subject is classed Hard.
    pub hard: f64,
    /// Mean score at or above which a subject is classed Medium.
    pub medium: f64,
    /// Topic score above which a topic counts as weak.
    pub weak_topic: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            hard: 7.0,
            medium: 4.0,
            weak_topic: 5.0,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, mean_score: f64) -> Difficulty {
        if mean_score >= self.hard {
            Difficulty::Hard
        } else if mean_score >= self.medium {
            Difficulty::Medium
        } else {
            Difficulty::Easy
        }
    }
}

pub fn aggregate(
    scored: &[ScoredTopic],
    thresholds: &TierThresholds,
) -> BTreeMap<String, SubjectAggregate> {
    #[derive(Default)]
    struct Totals {
        topics: usize,
        score: f64,
        weak: usize,
        correct: u64,
        incorrect: u64,
        blank: u64,
    }

    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
    for topic in scored {
        let entry = totals.entry(topic.subject.clone()).or_default();
        entry.topics += 1;
        entry.score += topic.priority_score;
        if topic.priority_score > thresholds.weak_topic {
            entry.weak += 1;
        }
        entry.correct += u64::from(topic.correct);
        entry.incorrect += u64::from(topic.incorrect);
        entry.blank += u64::from(topic.blank);
    }

    totals
        .into_iter()
        .map(|(subject, totals)| {
            let mean_score = if totals.topics == 0 {
                0.0
            } else {
                totals.score / totals.topics as f64
            };
            let attempted = totals.correct + totals.incorrect + totals.blank;
            let success_rate = if attempted == 0 {
                0.0
            } else {
                totals.correct as f64 / attempted as f64 * 100.0
            };
            let aggregate = SubjectAggregate {
                subject: subject.clone(),
                topic_count: totals.topics,
                total_score: totals.score,
                mean_score,
                weak_topics: totals.weak,
                weak_ratio: if totals.topics == 0 {
                    0.0
                } else {
                    totals.weak as f64 / totals.topics as f64
                },
                correct: totals.correct,
                incorrect: totals.incorrect,
                blank: totals.blank,
                net_score: totals.correct as f64 - totals.incorrect as f64 / 4.0,
                success_rate,
                tier: thresholds.classify(mean_score),
            };
            (subject, aggregate)
        })
        .collect()
}

/// Mean of the subject means; 0 when there are no subjects.
pub fn overall_risk(aggregates: &BTreeMap<String, SubjectAggregate>) -> f64 {
    if aggregates.is_empty() {
        return 0.0;
    }
    aggregates.values().map(|agg| agg.mean_score).sum::<f64>() / aggregates.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TopicCatalog;
    use crate::models::Category;
    use crate::risk::{analyze, rank, LinearFormula};
    use crate::store::PerformanceStore;

    fn scored(subject: &str, score: f64, correct: u32, incorrect: u32, blank: u32) -> ScoredTopic {
        ScoredTopic {
            subject: subject.to_string(),
            topic: format!("{subject} {score}"),
            priority_score: score,
            correct,
            incorrect,
            blank,
            actual_questions: correct + incorrect + blank,
            difficulty: Difficulty::Medium,
            category: Category::Medium,
            expected_questions: 2,
        }
    }

    #[test]
    fn rolls_up_scores_and_counts_per_subject() {
        let topics = vec![
            scored("Physics", 9.0, 1, 4, 1),
            scored("Physics", 6.0, 3, 0, 0),
            scored("History", 1.0, 5, 1, 0),
        ];
        let aggregates = aggregate(&topics, &TierThresholds::default());

        let physics = &aggregates["Physics"];
        assert_eq!(physics.topic_count, 2);
        assert!((physics.mean_score - 7.5).abs() < 1e-9);
        assert_eq!(physics.weak_topics, 2);
        assert_eq!(physics.tier, Difficulty::Hard);
        assert!((physics.net_score - 3.0).abs() < 1e-9);
        assert!((physics.success_rate - 4.0 / 9.0 * 100.0).abs() < 1e-9);

        let history = &aggregates["History"];
        assert_eq!(history.tier, Difficulty::Easy);
        assert_eq!(history.weak_topics, 0);
        assert!((history.net_score - 4.75).abs() < 1e-9);

        assert!((overall_risk(&aggregates) - 4.25).abs() < 1e-9);
    }

    #[test]
    fn large_counts_do_not_overflow_subject_totals() {
        let topics = vec![
            scored("Mathematics", 2.0, 3_000_000_000, 0, 0),
            scored("Mathematics", 1.0, 3_000_000_000, 1_000_000_000, u32::MAX - 4_000_000_000),
        ];
        let aggregates = aggregate(&topics, &TierThresholds::default());

        let maths = &aggregates["Mathematics"];
        assert_eq!(maths.correct, 6_000_000_000);
        assert_eq!(
            maths.correct + maths.incorrect + maths.blank,
            3_000_000_000 + u64::from(u32::MAX)
        );
        assert!(maths.success_rate > 0.0 && maths.success_rate <= 100.0);
        assert!((maths.net_score - 5_750_000_000.0).abs() < 1e-3);
    }

    #[test]
    fn recorded_counts_near_the_limit_roll_up() {
        let catalog = TopicCatalog::builtin().unwrap();
        let mut store = PerformanceStore::new();
        store
            .record("Mathematics", "Problems", 3_000_000_000, 0, 3_000_000_000)
            .unwrap();
        store
            .record("Mathematics", "Functions", 3_000_000_000, 0, 3_000_000_000)
            .unwrap();

        let ranked = rank(analyze(&catalog, &store, &LinearFormula::for_catalog(&catalog)).unwrap());
        let aggregates = aggregate(&ranked, &TierThresholds::default());
        assert_eq!(aggregates["Mathematics"].correct, 6_000_000_000);
        assert!((aggregates["Mathematics"].success_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn success_rate_is_zero_without_attempts() {
        let aggregates = aggregate(&[scored("Biology", 2.0, 0, 0, 0)], &TierThresholds::default());
        assert_eq!(aggregates["Biology"].success_rate, 0.0);
        assert!(overall_risk(&BTreeMap::new()).abs() < f64::EPSILON);
    }

    #[test]
    fn thresholds_are_configurable() {
        let thresholds = TierThresholds {
            hard: 10.0,
            medium: 5.0,
            weak_topic: 1.0,
        };
        assert_eq!(thresholds.classify(7.0), Difficulty::Medium);
        assert_eq!(thresholds.classify(4.9), Difficulty::Easy);
        assert_eq!(TierThresholds::default().classify(4.0), Difficulty::Medium);
    }

    #[test]
    fn success_rate_stays_within_bounds() {
        for correct in 0..6 {
            for incorrect in 0..6 {
                let topics = [scored("Chemistry", 1.0, correct, incorrect, 1)];
                let rate = aggregate(&topics, &TierThresholds::default())["Chemistry"].success_rate;
                assert!((0.0..=100.0).contains(&rate));
            }
        }
    }
}
