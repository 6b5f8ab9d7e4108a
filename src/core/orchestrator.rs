//! Main execution engine.
//!
//! Runs a batch of tasks under a declared concurrency policy and folds
//! every settlement into a single `Outcome`. The orchestrator raises no
//! failures of its own: everything it surfaces is a task failure,
//! classified before it is stored.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{ErrorDetail, Outcome, Settled, Task};

use super::classify::classify;

/// Concurrency policy for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// One task at a time, in submission order, halting at the first failure
    Sequential,

    /// All tasks in flight at once; latency bounded by the slowest task
    Concurrent,
}

impl Default for Policy {
    fn default() -> Self {
        Self::Sequential
    }
}

/// What a concurrent run does when some tasks fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFailureMode {
    /// Commit to the first observed failure; remaining results are discarded
    FailFast,

    /// Wait for every task and retain successes and failures side by side
    CollectAll,
}

impl Default for PartialFailureMode {
    fn default() -> Self {
        Self::FailFast
    }
}

/// Options for a single run
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Only meaningful under `Policy::Concurrent`
    pub on_partial_failure: PartialFailureMode,
}

/// How one spawned task settled: submission index, diagnostic name, a
/// settlement stamp taken the moment the work finished, and the raw result.
struct Settlement<T> {
    index: usize,
    name: String,
    stamp: u64,
    result: anyhow::Result<T>,
}

/// Main task orchestrator
pub struct Orchestrator;

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new() -> Self {
        Self
    }

    /// Execute a batch of tasks under the given policy.
    ///
    /// An empty batch is the identity case: `Success` with no values,
    /// and no task is started. Result sequences are always in submission
    /// order regardless of completion order.
    ///
    /// Task bodies in a concurrent batch are assumed independent; no
    /// ordering is guaranteed between their internal progress.
    #[instrument(skip(self, tasks, options), fields(tasks = tasks.len(), policy = ?policy))]
    pub async fn execute<T: Send + 'static>(
        &self,
        tasks: Vec<Task<T>>,
        policy: Policy,
        options: ExecuteOptions,
    ) -> Outcome<T> {
        let run_id = Uuid::new_v4();
        info!(%run_id, tasks = tasks.len(), "Starting run");

        if tasks.is_empty() {
            return Outcome::Success { values: Vec::new() };
        }

        let outcome = match policy {
            Policy::Sequential => self.run_sequential(tasks).await,
            Policy::Concurrent => match options.on_partial_failure {
                PartialFailureMode::FailFast => self.run_fail_fast(tasks).await,
                PartialFailureMode::CollectAll => self.run_collect_all(tasks).await,
            },
        };

        match outcome.error() {
            None => info!(%run_id, "Run completed successfully"),
            Some(error) => warn!(%run_id, %error, "Run finished with failure"),
        }

        outcome
    }

    /// Run tasks one at a time, awaiting each before starting the next.
    ///
    /// On the first failure the remaining tasks are never invoked; their
    /// closures are dropped unused.
    async fn run_sequential<T>(&self, tasks: Vec<Task<T>>) -> Outcome<T> {
        let mut values = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.into_iter().enumerate() {
            let name = task.name().to_string();
            debug!(index, task = %name, "Running task");

            match task.run().await {
                Ok(value) => values.push(value),
                Err(error) => {
                    let detail = classify(index, &name, &error);
                    warn!(index, task = %name, kind = ?detail.kind, "Task failed, halting run");
                    return Outcome::Failure { error: detail };
                }
            }
        }

        Outcome::Success { values }
    }

    /// Fan out, then return on the first observed failure.
    ///
    /// Remaining spawned tasks keep running detached; their settlements
    /// are discarded, never cancelled and never re-surfaced.
    async fn run_fail_fast<T: Send + 'static>(&self, tasks: Vec<Task<T>>) -> Outcome<T> {
        let total = tasks.len();
        let mut in_flight = fan_out(tasks);
        let mut values: Vec<(usize, T)> = Vec::with_capacity(total);

        while let Some(settlement) = in_flight.next().await {
            match settlement.result {
                Ok(value) => values.push((settlement.index, value)),
                Err(error) => {
                    let detail = classify(settlement.index, &settlement.name, &error);
                    warn!(
                        index = settlement.index,
                        task = %settlement.name,
                        kind = ?detail.kind,
                        "Task failed, committing failure outcome"
                    );
                    return Outcome::Failure { error: detail };
                }
            }
        }

        values.sort_by_key(|(index, _)| *index);
        Outcome::Success {
            values: values.into_iter().map(|(_, value)| value).collect(),
        }
    }

    /// Fan out and wait for every settlement.
    ///
    /// `first_error` is the failure with the lowest settlement stamp;
    /// exact ties fall back to submission order.
    async fn run_collect_all<T: Send + 'static>(&self, tasks: Vec<Task<T>>) -> Outcome<T> {
        let total = tasks.len();
        let mut in_flight = fan_out(tasks);
        let mut slots: Vec<Option<Settled<T>>> = Vec::new();
        slots.resize_with(total, || None);
        let mut first_error: Option<(u64, usize, ErrorDetail)> = None;

        while let Some(settlement) = in_flight.next().await {
            match settlement.result {
                Ok(value) => slots[settlement.index] = Some(Settled::Value(value)),
                Err(error) => {
                    let detail = classify(settlement.index, &settlement.name, &error);
                    let candidate = (settlement.stamp, settlement.index);
                    let earlier = first_error
                        .as_ref()
                        .map(|(stamp, index, _)| candidate < (*stamp, *index))
                        .unwrap_or(true);
                    if earlier {
                        first_error = Some((settlement.stamp, settlement.index, detail.clone()));
                    }
                    slots[settlement.index] = Some(Settled::Failed(detail));
                }
            }
        }

        let results: Vec<Settled<T>> = slots.into_iter().flatten().collect();

        match first_error {
            None => Outcome::Success {
                values: results
                    .into_iter()
                    .filter_map(|settled| match settled {
                        Settled::Value(value) => Some(value),
                        Settled::Failed(_) => None,
                    })
                    .collect(),
            },
            Some((_, _, first_error)) => Outcome::PartialFailure {
                results,
                first_error,
            },
        }
    }
}

/// Start every task without awaiting any, yielding settlements in
/// completion order.
///
/// Each task body is contained with `catch_unwind` so a panicking body
/// surfaces as a raw failure instead of tearing down the run, and stamps
/// a shared counter the moment it settles.
fn fan_out<T: Send + 'static>(
    tasks: Vec<Task<T>>,
) -> FuturesUnordered<impl Future<Output = Settlement<T>>> {
    let stamps = Arc::new(AtomicU64::new(0));

    tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| {
            let name = task.name().to_string();
            let stamps = Arc::clone(&stamps);

            let handle = tokio::spawn(async move {
                let result = AssertUnwindSafe(task.run())
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(anyhow::anyhow!("task panicked: {}", panic_message(&panic)))
                    });
                let stamp = stamps.fetch_add(1, Ordering::SeqCst);
                (stamp, result)
            });

            async move {
                match handle.await {
                    Ok((stamp, result)) => Settlement {
                        index,
                        name,
                        stamp,
                        result,
                    },
                    // Only reachable if the runtime tears the task down;
                    // reported like any other raw failure.
                    Err(join_error) => Settlement {
                        index,
                        name,
                        stamp: u64::MAX,
                        result: Err(anyhow::Error::new(join_error)),
                    },
                }
            }
        })
        .collect()
}

/// Best-effort text for a panic payload
fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_batch_is_identity() {
        let orchestrator = Orchestrator::new();

        let outcome: Outcome<i32> = orchestrator
            .execute(Vec::new(), Policy::Concurrent, ExecuteOptions::default())
            .await;

        assert_eq!(outcome, Outcome::Success { values: vec![] });
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let orchestrator = Orchestrator::new();
        let tasks = vec![
            Task::new("steady", || async { Ok(1) }),
            Task::new("explosive", || async { panic!("kaboom") }),
        ];

        let outcome = orchestrator
            .execute(tasks, Policy::Concurrent, ExecuteOptions::default())
            .await;

        let error = outcome.error().expect("panic must surface as a failure");
        assert_eq!(error.task_index, 1);
        assert!(error.message.contains("kaboom"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Policy::default(), Policy::Sequential);
        assert_eq!(PartialFailureMode::default(), PartialFailureMode::FailFast);
        assert_eq!(
            ExecuteOptions::default().on_partial_failure,
            PartialFailureMode::FailFast
        );
    }
}
