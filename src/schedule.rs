//! Turns ranked topics into a day-by-day study plan.
//!
//! Two modes are supported:
//! - **Time-slot** (default): a fixed set of clock windows per day, chosen by
//!   the daily study hours; categories are served round-robin so each day
//!   mixes hard and light material.
//! - **Bucket**: the ranked list is split evenly across days without clock times.

use std::collections::VecDeque;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::models::{Category, ScheduleEntry, ScoredTopic, TimeWindow};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleMode {
    #[default]
    TimeSlot,
    Bucket,
}

/// One step of the hours-to-slots function. A tier without `max_hours`
/// catches every remaining value and must come last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotTier {
    #[serde(default)]
    pub max_hours: Option<u32>,
    pub windows: Vec<TimeWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotPlan {
    tiers: Vec<SlotTier>,
}

impl SlotPlan {
    pub fn new(tiers: Vec<SlotTier>) -> Result<Self> {
        let plan = Self { tiers };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        let Some(last) = self.tiers.last() else {
            return Err(PlannerError::InvalidInput(
                "slot plan needs at least one tier".to_string(),
            ));
        };
        if last.max_hours.is_some() {
            return Err(PlannerError::InvalidInput(
                "last slot tier must not set max_hours".to_string(),
            ));
        }
        let mut previous = 0;
        for tier in &self.tiers[..self.tiers.len() - 1] {
            match tier.max_hours {
                Some(hours) if hours > previous => previous = hours,
                _ => {
                    return Err(PlannerError::InvalidInput(
                        "slot tiers must have increasing max_hours".to_string(),
                    ))
                }
            }
        }
        if self.tiers.iter().any(|tier| tier.windows.is_empty()) {
            return Err(PlannerError::InvalidInput(
                "every slot tier needs at least one window".to_string(),
            ));
        }
        Ok(())
    }

    pub fn windows_for(&self, hours_per_day: u32) -> &[TimeWindow] {
        self.tiers
            .iter()
            .find(|tier| tier.max_hours.map_or(true, |max| hours_per_day <= max))
            .map(|tier| tier.windows.as_slice())
            .unwrap_or_default()
    }

    pub fn slots_per_day(&self, hours_per_day: u32) -> usize {
        self.windows_for(hours_per_day).len()
    }
}

impl Default for SlotPlan {
    fn default() -> Self {
        let morning = window(8, 0, 10, 30);
        let late_morning = window(10, 30, 12, 30);
        let afternoon = window(16, 0, 18, 0);
        let evening = window(19, 0, 21, 0);
        Self {
            tiers: vec![
                SlotTier {
                    max_hours: Some(2),
                    windows: vec![morning],
                },
                SlotTier {
                    max_hours: Some(4),
                    windows: vec![morning, afternoon],
                },
                SlotTier {
                    max_hours: Some(6),
                    windows: vec![morning, late_morning, evening],
                },
                SlotTier {
                    max_hours: None,
                    windows: vec![morning, late_morning, afternoon, evening],
                },
            ],
        }
    }
}

/// Builds a window from constant clock times.
pub(crate) fn window(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> TimeWindow {
    let time = |h, m| chrono::NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
    TimeWindow {
        start: time(start_h, start_m),
        end: time(end_h, end_m),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleBuilder {
    mode: ScheduleMode,
    slots: SlotPlan,
}

impl ScheduleBuilder {
    pub fn new(mode: ScheduleMode, slots: SlotPlan) -> Self {
        Self { mode, slots }
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// `ranked` must already be in priority order. Topics that do not fit in
    /// `num_days` are dropped.
    pub fn build(
        &self,
        ranked: &[ScoredTopic],
        start_date: NaiveDate,
        num_days: i64,
        hours_per_day: i64,
    ) -> Result<Vec<ScheduleEntry>> {
        if num_days <= 0 {
            return Err(PlannerError::InvalidInput(format!(
                "number of days must be positive (got {num_days})"
            )));
        }
        if hours_per_day <= 0 {
            return Err(PlannerError::InvalidInput(format!(
                "hours per day must be positive (got {hours_per_day})"
            )));
        }
        let num_days = u32::try_from(num_days).map_err(|_| {
            PlannerError::InvalidInput(format!("number of days is too large (got {num_days})"))
        })?;
        let hours_per_day = u32::try_from(hours_per_day).unwrap_or(u32::MAX);

        let entries = match self.mode {
            ScheduleMode::TimeSlot => {
                self.build_time_slots(ranked, start_date, num_days, hours_per_day)?
            }
            ScheduleMode::Bucket => build_buckets(ranked, start_date, num_days)?,
        };

        if entries.len() < ranked.len() {
            tracing::warn!(
                scheduled = entries.len(),
                dropped = ranked.len() - entries.len(),
                "not every ranked topic fits in the schedule"
            );
        }
        tracing::debug!(mode = ?self.mode, days = num_days, entries = entries.len(), "built schedule");
        Ok(entries)
    }

    fn build_time_slots(
        &self,
        ranked: &[ScoredTopic],
        start_date: NaiveDate,
        num_days: u32,
        hours_per_day: u32,
    ) -> Result<Vec<ScheduleEntry>> {
        let windows = self.slots.windows_for(hours_per_day);
        let mut buckets: [VecDeque<&ScoredTopic>; 5] = Default::default();
        for topic in ranked {
            buckets[topic.category.index()].push_back(topic);
        }

        let mut entries = Vec::new();
        'days: for day in 0..num_days {
            let date = date_for(start_date, day)?;
            let mut cursor = 0;

            for slot in windows {
                let next = (0..Category::ORDER.len())
                    .map(|offset| (cursor + offset) % Category::ORDER.len())
                    .find(|&index| !buckets[index].is_empty());
                let Some(index) = next else {
                    break 'days;
                };
                let Some(topic) = buckets[index].pop_front() else {
                    break 'days;
                };
                cursor = (index + 1) % Category::ORDER.len();
                entries.push(entry_for(topic, day, date, Some(*slot)));
            }
        }

        Ok(entries)
    }
}

fn build_buckets(
    ranked: &[ScoredTopic],
    start_date: NaiveDate,
    num_days: u32,
) -> Result<Vec<ScheduleEntry>> {
    let topics_per_day = (ranked.len() / num_days as usize).max(1);
    let last_day = num_days - 1;

    ranked
        .iter()
        .enumerate()
        .map(|(position, topic)| {
            let day = u32::try_from(position / topics_per_day)
                .unwrap_or(u32::MAX)
                .min(last_day);
            Ok(entry_for(topic, day, date_for(start_date, day)?, None))
        })
        .collect()
}

fn date_for(start_date: NaiveDate, day: u32) -> Result<NaiveDate> {
    start_date
        .checked_add_days(Days::new(u64::from(day)))
        .ok_or_else(|| PlannerError::InvalidInput(format!("{start_date} + {day} days is out of range")))
}

fn entry_for(
    topic: &ScoredTopic,
    day: u32,
    date: NaiveDate,
    time_slot: Option<TimeWindow>,
) -> ScheduleEntry {
    ScheduleEntry {
        day: day + 1,
        date,
        time_slot,
        subject: topic.subject.clone(),
        topic: topic.topic.clone(),
        priority_score: topic.priority_score,
        difficulty: topic.difficulty,
        category: topic.category,
        correct: topic.correct,
        incorrect: topic.incorrect,
        blank: topic.blank,
    }
}
