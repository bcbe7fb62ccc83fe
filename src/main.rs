use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

use exam_study_planner::coach::{ChatCompletionsClient, Coach, CompletionClient};
use exam_study_planner::config::PlannerConfig;
use exam_study_planner::risk::FormulaKind;
use exam_study_planner::schedule::ScheduleMode;
use exam_study_planner::{
    aggregate, export, logging, report, risk, PerformanceStore, ScoredTopic, TopicCatalog,
};

#[derive(Parser)]
#[command(name = "study-planner")]
#[command(about = "Rank weak exam topics and build a study schedule", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Topic catalog CSV (defaults to the built-in catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Performance data (.csv or .json)
    #[arg(long)]
    input: PathBuf,
    /// Override the configured scoring formula
    #[arg(long, value_enum)]
    formula: Option<FormulaKind>,
}

#[derive(Args)]
struct PlanArgs {
    /// First study day (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long, default_value_t = 30)]
    days: i64,
    #[arg(long, default_value_t = 4)]
    hours: i64,
    /// Override the configured schedule mode
    #[arg(long, value_enum)]
    mode: Option<ScheduleMode>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the topic catalog
    Catalog,
    /// Score and rank topics
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Write the full analysis as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Build a study schedule
    Schedule {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        plan: PlanArgs,
        /// Write the schedule as CSV
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        plan: PlanArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Ask the coaching service for a personalised strategy
    Coach {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 4)]
        hours: u32,
    },
    /// Extract performance data from exam report text
    Extract {
        /// Plain-text exam report
        #[arg(long)]
        text: PathBuf,
        /// Destination JSON, usable as --input
        #[arg(long, default_value = "performance.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let config = PlannerConfig::load(cli.config.as_deref())?;
    let catalog = match &cli.catalog {
        Some(path) => TopicCatalog::from_csv_path(path)?,
        None => TopicCatalog::builtin()?,
    };

    match cli.command {
        Commands::Catalog => {
            for subject in catalog.subjects() {
                println!("{subject}");
                for topic in catalog.topics().iter().filter(|topic| topic.subject == subject) {
                    println!(
                        "  - {} [{}, {} questions, {}]",
                        topic.name, topic.difficulty, topic.expected_questions, topic.category
                    );
                }
            }
        }
        Commands::Analyze { input, limit, json } => {
            let ranked = ranked_topics(&catalog, &config, &input)?;

            if ranked.is_empty() {
                println!("No attempted topics found in {}.", input.input.display());
                return Ok(());
            }

            println!("Topics by priority:");
            for (position, topic) in ranked.iter().take(limit).enumerate() {
                println!(
                    "{:>3}. {} score {:.2} ({} correct, {} incorrect, {} blank)",
                    position + 1,
                    topic.label(),
                    topic.priority_score,
                    topic.correct,
                    topic.incorrect,
                    topic.blank
                );
            }

            if let Some(path) = json {
                export::export_analysis(&path, &ranked)?;
                println!("Analysis written to {}.", path.display());
            }
        }
        Commands::Schedule { input, plan, out } => {
            let ranked = ranked_topics(&catalog, &config, &input)?;
            let entries = config.schedule.builder(plan.mode).build(
                &ranked,
                start_date(plan.start),
                plan.days,
                plan.hours,
            )?;

            if entries.is_empty() {
                println!("Nothing to schedule.");
                return Ok(());
            }

            for entry in &entries {
                println!(
                    "Day {:>3} {} {:<11} {} - {} (score {:.2})",
                    entry.day,
                    entry.date_label(),
                    entry.slot_label(),
                    entry.subject,
                    entry.topic,
                    entry.priority_score
                );
            }

            if let Some(path) = out {
                export::export_schedule(&path, &entries, config.report.highlight)?;
                println!("Schedule written to {}.", path.display());
            }
        }
        Commands::Report { input, plan, out } => {
            let ranked = ranked_topics(&catalog, &config, &input)?;
            let aggregates = aggregate::aggregate(&ranked, &config.thresholds);
            let entries = config.schedule.builder(plan.mode).build(
                &ranked,
                start_date(plan.start),
                plan.days,
                plan.hours,
            )?;
            let report = report::build_report(&ranked, &aggregates, &entries, &config);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Coach { input, days, hours } => {
            let ranked = ranked_topics(&catalog, &config, &input)?;
            let aggregates = aggregate::aggregate(&ranked, &config.thresholds);
            let coach = build_coach(&config)?;
            let advice = coach
                .advise(&ranked, &aggregates, hours, days, config.thresholds.weak_topic)
                .await;
            println!("{advice}");
        }
        Commands::Extract { text, out } => {
            let content = std::fs::read_to_string(&text)
                .with_context(|| format!("failed to read {}", text.display()))?;
            let coach = build_coach(&config)?;
            match coach.extract_performance(&content, &catalog).await {
                Ok(store) => {
                    std::fs::write(&out, store.to_json(&catalog)?)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Extracted {} topics to {}.", store.len(), out.display());
                }
                Err(err) => {
                    tracing::error!(error = %err, "extraction failed");
                    println!("Could not extract results automatically; enter them manually instead.");
                }
            }
        }
    }

    Ok(())
}

fn start_date(start: Option<NaiveDate>) -> NaiveDate {
    start.unwrap_or_else(|| Utc::now().date_naive())
}

fn load_performance(path: &Path, catalog: &TopicCatalog) -> anyhow::Result<PerformanceStore> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let store = if is_json {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        PerformanceStore::from_json_str(&content, catalog)?
    } else {
        PerformanceStore::from_csv_path(path, catalog)?
    };
    Ok(store)
}

fn ranked_topics(
    catalog: &TopicCatalog,
    config: &PlannerConfig,
    input: &InputArgs,
) -> anyhow::Result<Vec<ScoredTopic>> {
    let store = load_performance(&input.input, catalog)?;
    let formula = input.formula.unwrap_or(config.scoring.formula).build(catalog);
    let scored = risk::analyze(catalog, &store, formula.as_ref())
        .with_context(|| format!("failed to analyse {}", input.input.display()))?;
    Ok(risk::rank(scored))
}

fn build_coach(config: &PlannerConfig) -> anyhow::Result<Coach> {
    let client = ChatCompletionsClient::from_env(&config.coach)?
        .map(|client| Box::new(client) as Box<dyn CompletionClient>);
    if client.is_none() {
        tracing::warn!(
            variable = %config.coach.api_key_env,
            "coaching service not configured"
        );
    }
    Ok(Coach::new(client, &config.coach))
}
