//! Optional text-generation collaborator.
//!
//! Nothing in scoring or scheduling depends on this module. Every call is
//! bounded by a timeout, retried a fixed number of times and, for advice,
//! degrades to a static message when the service cannot be reached.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::TopicCatalog;
use crate::config::CoachConfig;
use crate::error::{PlannerError, Result};
use crate::models::{ScoredTopic, SubjectAggregate};
use crate::store::{PerformanceStore, RawPerformance};

pub const FALLBACK_ADVICE: &str = "The coaching service is unavailable right now. \
Work through the priority topics at the top of your schedule first.";

const COACH_SYSTEM_PROMPT: &str = "You are an analytical exam-preparation coach who \
understands student psychology. Give data-driven, personalised and motivating strategies.";

const EXTRACT_SYSTEM_PROMPT: &str = "Reply only with the requested JSON.";

/// Longest slice of report text sent for extraction.
const MAX_EXTRACT_CHARS: usize = 10_000;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str, temperature: f32) -> Result<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl ChatCompletionsClient {
    pub fn new(config: &CoachConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| PlannerError::unavailable("coach", err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }

    /// Reads the API key from the configured environment variable.
    /// Returns `None` when the variable is unset or empty.
    pub fn from_env(config: &CoachConfig) -> Result<Option<Self>> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Self::new(config, key).map(Some),
            _ => {
                tracing::debug!(variable = %config.api_key_env, "no API key, coach disabled");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(&self, system: &str, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| PlannerError::unavailable("coach", err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlannerError::unavailable(
                "coach",
                format!("HTTP {status}: {body}"),
            ));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| PlannerError::unavailable("coach", err.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| PlannerError::unavailable("coach", "empty completion"))
    }
}

pub struct Coach {
    client: Option<Box<dyn CompletionClient>>,
    timeout: Duration,
    max_attempts: u32,
    temperature: f32,
}

impl Coach {
    pub fn new(client: Option<Box<dyn CompletionClient>>, config: &CoachConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts.max(1),
            temperature: config.temperature,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Free-form study advice. Never fails: errors become [`FALLBACK_ADVICE`].
    pub async fn advise(
        &self,
        ranked: &[ScoredTopic],
        aggregates: &BTreeMap<String, SubjectAggregate>,
        hours_per_day: u32,
        num_days: u32,
        weak_threshold: f64,
    ) -> String {
        if ranked.is_empty() {
            return FALLBACK_ADVICE.to_string();
        }
        let prompt = coaching_prompt(ranked, aggregates, hours_per_day, num_days, weak_threshold);
        match self.call(COACH_SYSTEM_PROMPT, &prompt, self.temperature).await {
            Ok(advice) => advice,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to static advice");
                FALLBACK_ADVICE.to_string()
            }
        }
    }

    /// Asks the service to pull per-topic counts out of an exam report.
    /// Topics the catalog does not know are dropped.
    pub async fn extract_performance(
        &self,
        report_text: &str,
        catalog: &TopicCatalog,
    ) -> Result<PerformanceStore> {
        let prompt = extraction_prompt(report_text, catalog);
        let reply = self.call(EXTRACT_SYSTEM_PROMPT, &prompt, 0.1).await?;
        let raw: RawPerformance = serde_json::from_str(strip_code_fences(&reply)).map_err(|err| {
            PlannerError::unavailable("extraction", format!("unparseable reply: {err}"))
        })?;
        let store = PerformanceStore::from_raw_lenient(raw, catalog);
        tracing::info!(entries = store.len(), "extracted performance data");
        Ok(store)
    }

    async fn call(&self, system: &str, prompt: &str, temperature: f32) -> Result<String> {
        let Some(client) = &self.client else {
            return Err(PlannerError::unavailable("coach", "no client configured"));
        };

        let mut last_error = PlannerError::unavailable("coach", "no attempt made");
        for attempt in 1..=self.max_attempts {
            match tokio::time::timeout(self.timeout, client.complete(system, prompt, temperature))
                .await
            {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(err)) => {
                    tracing::warn!(attempt, error = %err, "completion failed");
                    last_error = err;
                }
                Err(_) => {
                    tracing::warn!(attempt, timeout = ?self.timeout, "completion timed out");
                    last_error = PlannerError::unavailable(
                        "coach",
                        format!("timed out after {:?}", self.timeout),
                    );
                }
            }
        }
        Err(last_error)
    }
}

pub fn coaching_prompt(
    ranked: &[ScoredTopic],
    aggregates: &BTreeMap<String, SubjectAggregate>,
    hours_per_day: u32,
    num_days: u32,
    weak_threshold: f64,
) -> String {
    let critical = &ranked[..ranked.len().min(8)];
    let developing = ranked.get(8..ranked.len().min(16)).unwrap_or_default();
    let strongest = &ranked[ranked.len().saturating_sub(5)..];
    let critical_count = ranked
        .iter()
        .filter(|topic| topic.priority_score > weak_threshold)
        .count();
    let weakest = aggregates
        .values()
        .max_by(|a, b| a.mean_score.total_cmp(&b.mean_score));

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Prepare a personalised {num_days}-day study strategy for this student."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "STUDENT PROFILE");
    let _ = writeln!(
        prompt,
        "- Total study time: {} hours ({num_days} days x {hours_per_day} hours)",
        u64::from(num_days) * u64::from(hours_per_day)
    );
    let _ = writeln!(prompt, "- Topics in critical condition: {critical_count}");
    if let Some(subject) = weakest {
        let _ = writeln!(
            prompt,
            "- Weakest subject: {} (risk score {:.1})",
            subject.subject, subject.mean_score
        );
    }

    let mut section = |title: &str, topics: &[ScoredTopic]| {
        if topics.is_empty() {
            return;
        }
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "{title}");
        for topic in topics {
            let _ = writeln!(
                prompt,
                "- {} ({}) - risk {:.1}",
                topic.topic, topic.subject, topic.priority_score
            );
        }
    };
    section("TOPICS NEEDING URGENT WORK", critical);
    section("TOPICS TO IMPROVE", developing);
    section("STRONG AREAS TO MAINTAIN", strongest);

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "WEAK TOPIC RATIO BY SUBJECT");
    for subject in aggregates.values() {
        let _ = writeln!(
            prompt,
            "- {}: {:.0}% weak topics",
            subject.subject,
            subject.weak_ratio * 100.0
        );
    }

    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Cover: a weekly plan for the critical topics, study techniques per topic, \
time management, resources, motivation, a practice-exam calendar, self-assessment, \
sleep and nutrition, stress management and tactics for the final week."
    );
    prompt
}

fn extraction_prompt(report_text: &str, catalog: &TopicCatalog) -> String {
    let text: String = report_text.chars().take(MAX_EXTRACT_CHARS).collect();
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Below is text extracted from a practice exam result sheet. Extract the \
correct, incorrect and blank counts per subject and topic."
    );
    let _ = writeln!(
        prompt,
        "Answer with JSON shaped as {{\"Subject\": {{\"Topic\": {{\"correct\": n, \
\"incorrect\": n, \"blank\": n, \"actual\": n}}}}}}."
    );
    let _ = writeln!(prompt, "Use only these subjects and topics:");
    for subject in catalog.subjects() {
        let topics: Vec<&str> = catalog
            .topics()
            .iter()
            .filter(|topic| topic.subject == subject)
            .map(|topic| topic.name.as_str())
            .collect();
        let _ = writeln!(prompt, "- {subject}: {}", topics.join("; "));
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "TEXT:");
    let _ = writeln!(prompt, "{text}");
    prompt
}

/// Removes a surrounding markdown code fence, if any.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, TierThresholds};
    use crate::models::{Category, Difficulty};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Scripted {
        reply: Result<String>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl CompletionClient for Scripted {
        async fn complete(&self, _system: &str, _prompt: &str, _temperature: f32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(err) => Err(PlannerError::unavailable("coach", err.to_string())),
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl CompletionClient for Stalled {
        async fn complete(&self, _system: &str, _prompt: &str, _temperature: f32) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn config() -> CoachConfig {
        CoachConfig {
            timeout_secs: 1,
            max_attempts: 3,
            ..CoachConfig::default()
        }
    }

    fn scripted(reply: Result<String>) -> (Coach, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let client = Scripted {
            reply,
            calls: Arc::clone(&calls),
        };
        (Coach::new(Some(Box::new(client)), &config()), calls)
    }

    fn ranked(count: usize) -> Vec<ScoredTopic> {
        (0..count)
            .map(|i| ScoredTopic {
                subject: if i % 2 == 0 { "Physics" } else { "Biology" }.to_string(),
                topic: format!("Topic {i}"),
                priority_score: 20.0 - i as f64,
                correct: 1,
                incorrect: 2,
                blank: 1,
                actual_questions: 4,
                difficulty: Difficulty::Medium,
                category: Category::Medium,
                expected_questions: 2,
            })
            .collect()
    }

    #[tokio::test]
    async fn advice_comes_from_the_client() {
        let (coach, calls) = scripted(Ok("Study harder.".to_string()));
        let topics = ranked(3);
        let aggregates = aggregate(&topics, &TierThresholds::default());
        let advice = coach.advise(&topics, &aggregates, 4, 30, 5.0).await;
        assert_eq!(advice, "Study harder.");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_retried_then_fall_back() {
        let (coach, calls) = scripted(Err(PlannerError::unavailable("coach", "HTTP 503")));
        let topics = ranked(3);
        let advice = coach.advise(&topics, &BTreeMap::new(), 4, 30, 5.0).await;
        assert_eq!(advice, FALLBACK_ADVICE);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_client_times_out() {
        let coach = Coach::new(Some(Box::new(Stalled)), &config());
        let advice = coach.advise(&ranked(2), &BTreeMap::new(), 2, 7, 5.0).await;
        assert_eq!(advice, FALLBACK_ADVICE);
    }

    #[tokio::test]
    async fn missing_client_degrades_gracefully() {
        let coach = Coach::new(None, &config());
        assert!(!coach.is_available());
        assert_eq!(
            coach.advise(&ranked(2), &BTreeMap::new(), 2, 7, 5.0).await,
            FALLBACK_ADVICE
        );
        let catalog = TopicCatalog::builtin().unwrap();
        assert!(matches!(
            coach.extract_performance("text", &catalog).await,
            Err(PlannerError::ExternalServiceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn extraction_parses_fenced_json() {
        let reply = "```json\n{\"Mathematics\": {\"Problems\": {\"correct\": 3, \"incorrect\": 2}, \
                     \"Calculus\": {\"correct\": 1, \"incorrect\": 0}}}\n```";
        let (coach, _) = scripted(Ok(reply.to_string()));
        let catalog = TopicCatalog::builtin().unwrap();
        let store = coach.extract_performance("sheet", &catalog).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("Mathematics", "Problems").unwrap().blank, 4);
    }

    #[tokio::test]
    async fn unparseable_extraction_is_unavailable() {
        let (coach, _) = scripted(Ok("I could not read the sheet.".to_string()));
        let catalog = TopicCatalog::builtin().unwrap();
        assert!(matches!(
            coach.extract_performance("sheet", &catalog).await,
            Err(PlannerError::ExternalServiceUnavailable { .. })
        ));
    }

    #[test]
    fn prompt_groups_topics_by_urgency() {
        let topics = ranked(20);
        let aggregates = aggregate(&topics, &TierThresholds::default());
        let prompt = coaching_prompt(&topics, &aggregates, 4, 30, 5.0);

        assert!(prompt.contains("Total study time: 120 hours (30 days x 4 hours)"));
        assert!(prompt.contains("Topics in critical condition: 15"));
        assert!(prompt.contains("- Topic 0 (Physics) - risk 20.0"));
        assert!(prompt.contains("TOPICS TO IMPROVE\n- Topic 8 (Physics)"));
        assert!(prompt.contains("STRONG AREAS TO MAINTAIN\n- Topic 15 (Biology)"));
        assert!(prompt.contains("- Physics: "));
    }

    #[test]
    fn strips_optional_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }
}
