use std::collections::BTreeMap;
use std::fmt::Write;

use crate::aggregate;
use crate::config::PlannerConfig;
use crate::models::{Category, Difficulty, ScheduleEntry, ScoredTopic, SubjectAggregate};
use crate::resources;

/// Video searches listed per focus topic.
const SEARCHES_PER_TOPIC: usize = 3;

pub fn urgency_label(mean_score: f64, config: &PlannerConfig) -> &'static str {
    if mean_score >= config.report.urgent {
        "urgent"
    } else if mean_score >= config.report.moderate {
        "moderate"
    } else {
        "on track"
    }
}

pub fn study_tips(difficulty: Difficulty) -> &'static [&'static str] {
    match difficulty {
        Difficulty::Hard => &[
            "Review the core concepts first",
            "Work through many solved examples",
            "Set aside 30 minutes a day",
        ],
        Difficulty::Medium => &[
            "Practise from a question bank",
            "Take short timed tests",
            "Set aside 20 minutes a day",
        ],
        Difficulty::Easy => &[
            "Do short, frequent reviews",
            "Memorise the key rules and formulas",
            "Set aside 10 minutes a day",
        ],
    }
}

pub fn strategy(overall_risk: f64, config: &PlannerConfig) -> (&'static str, &'static [&'static str]) {
    if overall_risk >= config.report.urgent {
        (
            "Recovery plan",
            &[
                "Focus on fundamentals before practice exams",
                "Study at least six hours a day",
                "Start with introductory books",
                "Use video lessons for topics you cannot follow in print",
            ],
        )
    } else if overall_risk >= config.report.moderate {
        (
            "Targeted plan",
            &[
                "Weight study time towards weak topics",
                "Study four to five hours a day",
                "Focus on question banks",
                "Take regular timed tests",
            ],
        )
    } else {
        (
            "Consolidation plan",
            &[
                "Keep every topic in rotation",
                "Study three to four hours a day",
                "Focus on full practice exams",
                "Work on answering speed",
            ],
        )
    }
}

/// Scheduled topic count per subject, largest first.
pub fn schedule_by_subject(schedule: &[ScheduleEntry]) -> Vec<(&str, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in schedule {
        *counts.entry(entry.subject.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(&str, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn build_report(
    ranked: &[ScoredTopic],
    aggregates: &BTreeMap<String, SubjectAggregate>,
    schedule: &[ScheduleEntry],
    config: &PlannerConfig,
) -> String {
    let mut output = String::new();
    let top = config.report.top_topics;

    let _ = writeln!(output, "# Study Plan Report");
    let _ = writeln!(
        output,
        "{} topics attempted across {} subjects",
        ranked.len(),
        aggregates.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Priority Topics");

    if ranked.is_empty() {
        let _ = writeln!(output, "No attempted topics to rank.");
    } else {
        for (position, topic) in ranked.iter().take(top).enumerate() {
            let _ = writeln!(
                output,
                "{}. {} (score {:.2}, {} correct / {} incorrect / {} blank)",
                position + 1,
                topic.label(),
                topic.priority_score,
                topic.correct,
                topic.incorrect,
                topic.blank
            );
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## Strongest Topics");
        let strongest = ranked.len().saturating_sub(top);
        for topic in ranked[strongest..].iter().rev() {
            let _ = writeln!(output, "- {} (score {:.2})", topic.label(), topic.priority_score);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subject Overview");

    let mut subjects: Vec<&SubjectAggregate> = aggregates.values().collect();
    subjects.sort_by(|a, b| b.mean_score.total_cmp(&a.mean_score));

    if subjects.is_empty() {
        let _ = writeln!(output, "No subjects to summarise.");
    } else {
        let _ = writeln!(
            output,
            "| Subject | Mean risk | Status | Tier | Weak topics | Net score | Success rate |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
        for subject in &subjects {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {} | {} | {}/{} | {:.2} | {:.1}% |",
                subject.subject,
                subject.mean_score,
                urgency_label(subject.mean_score, config),
                subject.tier,
                subject.weak_topics,
                subject.topic_count,
                subject.net_score,
                subject.success_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Focus Areas");

    for subject in &subjects {
        let focus: Vec<&ScoredTopic> = ranked
            .iter()
            .filter(|topic| {
                topic.subject == subject.subject && topic.priority_score >= config.report.focus
            })
            .take(5)
            .collect();

        let _ = writeln!(output, "### {}", subject.subject);
        if focus.is_empty() {
            let _ = writeln!(output, "No critical weaknesses.");
        }
        for topic in focus {
            let _ = writeln!(
                output,
                "- **{}** (score {:.2}): {}",
                topic.topic,
                topic.priority_score,
                study_tips(topic.difficulty).join("; ")
            );
            let searches = resources::video_searches(&topic.subject, &topic.topic);
            let _ = writeln!(
                output,
                "  - Videos: {}",
                searches[..SEARCHES_PER_TOPIC].join("; ")
            );
        }

        let books = resources::books(&subject.subject, subject.tier);
        if !books.is_empty() {
            let _ = writeln!(output, "- Books ({} tier): {}", subject.tier, books.join("; "));
        }
        let channels = resources::channels(&subject.subject);
        if !channels.is_empty() {
            let _ = writeln!(output, "- Channels: {}", channels.join(", "));
        }
    }

    let overall = aggregate::overall_risk(aggregates);
    let (title, steps) = strategy(overall, config);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Strategy: {title} (overall risk {overall:.2})");
    for step in steps {
        let _ = writeln!(output, "- {step}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Preferred Study Windows");
    for category in Category::ORDER {
        let windows: Vec<String> = config
            .schedule
            .windows_for_category(category)
            .iter()
            .map(ToString::to_string)
            .collect();
        if !windows.is_empty() {
            let _ = writeln!(output, "- {}: {}", category, windows.join(", "));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Schedule by Subject");

    if schedule.is_empty() {
        let _ = writeln!(output, "Nothing scheduled.");
    } else {
        let _ = writeln!(output, "| Subject | Topics | Share |");
        let _ = writeln!(output, "|---|---|---|");
        for (subject, count) in schedule_by_subject(schedule) {
            let _ = writeln!(
                output,
                "| {} | {} | {:.1}% |",
                subject,
                count,
                count as f64 / schedule.len() as f64 * 100.0
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Schedule");

    if schedule.is_empty() {
        let _ = writeln!(output, "Nothing scheduled.");
    } else {
        let _ = writeln!(output, "| Day | Date | Time | Subject | Topic | Score |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for entry in schedule {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {:.2} |",
                entry.day,
                entry.date_label(),
                entry.slot_label(),
                entry.subject,
                entry.topic,
                entry.priority_score
            );
        }
    }

    output
}
