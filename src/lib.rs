//! Exam study planner.
//!
//! Turns per-topic practice-exam results into a ranked list of weak topics
//! and a day-by-day study schedule.
//!
//! - [`catalog`]: subjects, topics and their expected question counts
//! - [`store`]: caller-owned answer counts for the current session
//! - [`risk`]: priority formulas and topic ranking
//! - [`schedule`]: time-slot and bucket schedule builders
//! - [`aggregate`]: per-subject rollups
//! - [`report`], [`export`]: markdown, CSV and JSON output
//! - [`resources`]: books, channels and video searches per subject
//! - [`coach`]: optional text-generation collaborator

pub mod aggregate;
pub mod catalog;
pub mod coach;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod report;
pub mod resources;
pub mod risk;
pub mod schedule;
pub mod store;

pub use catalog::TopicCatalog;
pub use error::PlannerError;
pub use models::{PerformanceEntry, ScheduleEntry, ScoredTopic, SubjectAggregate, Topic};
pub use store::PerformanceStore;
