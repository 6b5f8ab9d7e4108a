//! Command-line interface for fanout.
//!
//! The CLI is the reference caller: it constructs tasks, hands them to
//! the orchestrator, and applies display and exit-code side effects to
//! the returned outcome after the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;

use crate::adapters::http::resource_task;
use crate::adapters::timer;
use crate::adapters::{HttpTransport, Transport};
use crate::config::TransportConfig;
use crate::core::{Batch, ExecuteOptions, Orchestrator, PartialFailureMode, Policy};
use crate::domain::{Outcome, Settled, Task};

/// fanout - Policy-driven async task orchestrator
#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch file
    Run {
        /// Path to the batch YAML file
        batch_file: PathBuf,

        /// Override the batch's declared policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Override the base URL for resource tasks
        #[arg(long)]
        base_url: Option<String>,

        /// Print the full outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Fetch one or more resources ad hoc
    Fetch {
        /// Resource identifiers (resolved against the base URL)
        identifiers: Vec<String>,

        /// Run the fetches concurrently
        #[arg(long)]
        concurrent: bool,

        /// Retain all results instead of failing fast
        #[arg(long)]
        collect_all: bool,

        /// Fields that must be present in each decoded body
        #[arg(short, long)]
        require: Vec<String>,

        /// Override the base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Print the full outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Run simulated user lookups after a delay
    Lookup {
        /// User ids to look up (non-positive ids fail classification)
        user_ids: Vec<i64>,

        /// Delay per lookup in milliseconds
        #[arg(short, long, default_value = "1000")]
        delay_ms: u64,

        /// Run the lookups concurrently
        #[arg(long)]
        concurrent: bool,

        /// Retain all results instead of failing fast
        #[arg(long)]
        collect_all: bool,

        /// Print the full outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Concurrency policy for CLI flags (maps to Policy)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// One task at a time, in order
    Sequential,

    /// All tasks in flight at once
    Concurrent,
}

impl From<PolicyArg> for Policy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Sequential => Policy::Sequential,
            PolicyArg::Concurrent => Policy::Concurrent,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                batch_file,
                policy,
                base_url,
                json,
            } => run_batch(&batch_file, policy, base_url, json).await,
            Commands::Fetch {
                identifiers,
                concurrent,
                collect_all,
                require,
                base_url,
                json,
            } => {
                fetch_resources(identifiers, concurrent, collect_all, require, base_url, json)
                    .await
            }
            Commands::Lookup {
                user_ids,
                delay_ms,
                concurrent,
                collect_all,
                json,
            } => lookup_users(user_ids, delay_ms, concurrent, collect_all, json).await,
            Commands::Config => show_config(),
        }
    }
}

/// Report printed after a run (JSON mode)
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    batch: &'a str,
    policy: Policy,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    elapsed_ms: u64,
    outcome: &'a Outcome<Value>,
}

/// Run a batch file
async fn run_batch(
    batch_file: &Path,
    policy: Option<PolicyArg>,
    base_url: Option<String>,
    json: bool,
) -> Result<()> {
    let batch = Batch::from_file(batch_file)?;
    batch.validate()?;

    let policy = policy.map(Policy::from).unwrap_or(batch.policy);
    let options = batch.options();

    let config = TransportConfig::from_env().with_base_url(base_url);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config)?);

    let tasks = batch.build_tasks(transport);
    let outcome = drive(&batch.name, tasks, policy, options, json).await?;

    finish(&outcome)
}

/// Fetch ad-hoc resources
async fn fetch_resources(
    identifiers: Vec<String>,
    concurrent: bool,
    collect_all: bool,
    require: Vec<String>,
    base_url: Option<String>,
    json: bool,
) -> Result<()> {
    let config = TransportConfig::from_env().with_base_url(base_url);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config)?);

    let tasks: Vec<Task<Value>> = identifiers
        .into_iter()
        .map(|identifier| {
            resource_task(
                identifier.clone(),
                Arc::clone(&transport),
                identifier,
                require.clone(),
            )
        })
        .collect();

    let outcome = drive("fetch", tasks, policy_for(concurrent), options_for(collect_all), json)
        .await?;

    finish(&outcome)
}

/// Run simulated user lookups
async fn lookup_users(
    user_ids: Vec<i64>,
    delay_ms: u64,
    concurrent: bool,
    collect_all: bool,
    json: bool,
) -> Result<()> {
    let delay = Duration::from_millis(delay_ms);

    let tasks: Vec<Task<Value>> = user_ids
        .into_iter()
        .map(|user_id| {
            timer::after(format!("lookup-{}", user_id), delay, move || {
                let record = timer::lookup_user(user_id)?;
                Ok(serde_json::to_value(record)?)
            })
        })
        .collect();

    let outcome = drive(
        "lookup",
        tasks,
        policy_for(concurrent),
        options_for(collect_all),
        json,
    )
    .await?;

    finish(&outcome)
}

/// Show the resolved configuration
fn show_config() -> Result<()> {
    let config = TransportConfig::from_env();
    let yaml = serde_yaml::to_string(&config).context("Failed to render configuration")?;
    print!("{}", yaml);
    Ok(())
}

fn policy_for(concurrent: bool) -> Policy {
    if concurrent {
        Policy::Concurrent
    } else {
        Policy::Sequential
    }
}

fn options_for(collect_all: bool) -> ExecuteOptions {
    ExecuteOptions {
        on_partial_failure: if collect_all {
            PartialFailureMode::CollectAll
        } else {
            PartialFailureMode::FailFast
        },
    }
}

/// Execute the tasks and print the outcome
async fn drive(
    name: &str,
    tasks: Vec<Task<Value>>,
    policy: Policy,
    options: ExecuteOptions,
    json: bool,
) -> Result<Outcome<Value>> {
    let orchestrator = Orchestrator::new();
    let started_at = Utc::now();
    let start = std::time::Instant::now();

    let outcome = orchestrator.execute(tasks, policy, options).await;

    let finished_at = Utc::now();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if json {
        let report = RunReport {
            batch: name,
            policy,
            started_at,
            finished_at,
            elapsed_ms,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(name, elapsed_ms, &outcome);
    }

    Ok(outcome)
}

/// Human-readable outcome summary
fn print_summary(name: &str, elapsed_ms: u64, outcome: &Outcome<Value>) {
    match outcome {
        Outcome::Success { values } => {
            for value in values {
                println!("{}", value);
            }
            eprintln!("[{} succeeded: {} value(s) in {}ms]", name, values.len(), elapsed_ms);
        }
        Outcome::PartialFailure {
            results,
            first_error,
        } => {
            for settled in results {
                match settled {
                    Settled::Value(value) => println!("{}", value),
                    Settled::Failed(detail) => println!("!! {}", detail),
                }
            }
            eprintln!("[{} partially failed in {}ms; first error: {}]", name, elapsed_ms, first_error);
        }
        Outcome::Failure { error } => {
            eprintln!("[{} failed in {}ms: {}]", name, elapsed_ms, error);
        }
    }
}

/// Exit non-zero unless every task succeeded
fn finish(outcome: &Outcome<Value>) -> Result<()> {
    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
