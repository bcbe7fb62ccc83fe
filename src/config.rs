//! TOML configuration.
//!
//! Every section is optional; missing fields fall back to the defaults below.
//!
//! ```toml
//! [scoring]
//! formula = "logarithmic"
//!
//! [schedule]
//! mode = "time-slot"
//!
//! [thresholds]
//! hard = 7.0
//! medium = 4.0
//! weak_topic = 5.0
//!
//! [report]
//! focus = 3.0
//!
//! [coach]
//! model = "llama3-70b-8192"
//! timeout_secs = 30
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::aggregate::TierThresholds;
use crate::models::{Category, TimeWindow};
use crate::risk::FormulaKind;
use crate::schedule::{window, ScheduleBuilder, ScheduleMode, SlotPlan};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub scoring: ScoringConfig,
    pub schedule: ScheduleConfig,
    pub thresholds: TierThresholds,
    pub report: ReportConfig,
    pub coach: CoachConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub formula: FormulaKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub mode: ScheduleMode,
    /// Hours-per-day step function selecting the day's windows.
    pub slot_tiers: SlotPlan,
    /// Preferred time of day per category, keyed by lowercase category name.
    pub category_windows: BTreeMap<String, Vec<TimeWindow>>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let category_windows = [
            (Category::Hard, vec![window(8, 0, 10, 30), window(16, 0, 18, 0)]),
            (Category::Medium, vec![window(10, 30, 12, 30), window(19, 0, 21, 0)]),
            (Category::Easy, vec![window(13, 30, 15, 30), window(21, 0, 22, 30)]),
            (Category::Language, vec![window(6, 30, 8, 0), window(22, 30, 23, 30)]),
            (Category::Rote, vec![window(7, 0, 8, 30), window(22, 0, 23, 0)]),
        ]
        .into_iter()
        .map(|(category, windows)| (category_key(category), windows))
        .collect();
        Self {
            mode: ScheduleMode::default(),
            slot_tiers: SlotPlan::default(),
            category_windows,
        }
    }
}

impl ScheduleConfig {
    pub fn builder(&self, mode_override: Option<ScheduleMode>) -> ScheduleBuilder {
        ScheduleBuilder::new(mode_override.unwrap_or(self.mode), self.slot_tiers.clone())
    }

    pub fn windows_for_category(&self, category: Category) -> &[TimeWindow] {
        self.category_windows
            .get(&category_key(category))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn category_key(category: Category) -> String {
    category.as_str().to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Subject mean at or above which the subject needs urgent work.
    pub urgent: f64,
    /// Subject mean at or above which the subject needs steady work.
    pub moderate: f64,
    /// Score above which schedule rows are highlighted.
    pub highlight: f64,
    /// Topic score at or above which a topic is listed under its subject's focus areas.
    pub focus: f64,
    pub top_topics: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            urgent: 5.0,
            moderate: 3.0,
            highlight: 5.0,
            focus: 3.0,
            top_topics: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// OpenAI-compatible API root.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-70b-8192".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 60,
            max_attempts: 2,
            max_tokens: 4000,
            temperature: 0.7,
        }
    }
}

impl PlannerConfig {
    /// Reads the config file if one is given, otherwise returns defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.schedule.slot_tiers.validate()?;
        for key in self.schedule.category_windows.keys() {
            key.parse::<Category>()?;
        }
        anyhow::ensure!(
            self.thresholds.hard >= self.thresholds.medium,
            "thresholds.hard must not be below thresholds.medium"
        );
        anyhow::ensure!(
            self.report.urgent >= self.report.moderate,
            "report.urgent must not be below report.moderate"
        );
        anyhow::ensure!(self.report.focus >= 0.0, "report.focus must not be negative");
        anyhow::ensure!(self.coach.max_attempts > 0, "coach.max_attempts must be positive");
        anyhow::ensure!(self.coach.timeout_secs > 0, "coach.timeout_secs must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = PlannerConfig::from_toml("").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.scoring.formula, FormulaKind::Linear);
        assert_eq!(config.schedule.mode, ScheduleMode::TimeSlot);
        assert_eq!(config.schedule.category_windows.len(), 5);
    }

    #[test]
    fn parses_partial_sections() {
        let config = PlannerConfig::from_toml(
            r#"
            [scoring]
            formula = "logarithmic"

            [schedule]
            mode = "bucket"

            [[schedule.slot_tiers]]
            max_hours = 3
            windows = ["09:00-11:00"]

            [[schedule.slot_tiers]]
            windows = ["09:00-11:00", "14:00-16:00"]

            [schedule.category_windows]
            rote = ["06:00-07:00"]

            [thresholds]
            hard = 9.0
            "#,
        )
        .unwrap();

        assert_eq!(config.scoring.formula, FormulaKind::Logarithmic);
        assert_eq!(config.schedule.mode, ScheduleMode::Bucket);
        assert_eq!(config.schedule.slot_tiers.slots_per_day(3), 1);
        assert_eq!(config.schedule.slot_tiers.slots_per_day(8), 2);
        assert_eq!(
            config.schedule.windows_for_category(Category::Rote)[0].to_string(),
            "06:00-07:00"
        );
        assert_eq!(config.schedule.windows_for_category(Category::Hard).len(), 0);
        assert_eq!(config.thresholds.hard, 9.0);
        assert_eq!(config.thresholds.medium, 4.0);
        assert_eq!(config.report.focus, 3.0);
    }

    #[test]
    fn rejects_inconsistent_values() {
        assert!(PlannerConfig::from_toml("[thresholds]\nhard = 1.0\nmedium = 2.0\n").is_err());
        assert!(PlannerConfig::from_toml("[coach]\nmax_attempts = 0\n").is_err());
        assert!(PlannerConfig::from_toml("[report]\nfocus = -1.0\n").is_err());
        assert!(PlannerConfig::from_toml("[[schedule.slot_tiers]]\nmax_hours = 2\nwindows = [\"08:00-09:00\"]\n").is_err());
        assert!(PlannerConfig::from_toml("[scoring]\nformula = \"quadratic\"\n").is_err());
        assert!(PlannerConfig::from_toml("[schedule.category_windows]\nmusic = [\"08:00-09:00\"]\n").is_err());
    }

    #[test]
    fn mode_override_wins() {
        let config = PlannerConfig::default();
        assert_eq!(config.schedule.builder(None).mode(), ScheduleMode::TimeSlot);
        assert_eq!(
            config.schedule.builder(Some(ScheduleMode::Bucket)).mode(),
            ScheduleMode::Bucket
        );
    }
}
