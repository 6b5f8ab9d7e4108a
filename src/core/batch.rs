//! Batch definitions and loading.
//!
//! Batches are defined in YAML: a concurrency policy plus an ordered
//! list of task specs, each lowered into a runnable `Task` against the
//! configured transport.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::http::resource_task;
use crate::adapters::timer::{self, lookup_user};
use crate::adapters::Transport;
use crate::domain::Task;

use super::orchestrator::{ExecuteOptions, PartialFailureMode, Policy};

/// A complete batch definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Batch name (used in CLI output and logs)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Concurrency policy for the run
    #[serde(default)]
    pub policy: Policy,

    /// Failure handling under the concurrent policy
    #[serde(default)]
    pub on_partial_failure: PartialFailureMode,

    /// Ordered list of tasks to run
    pub tasks: Vec<TaskSpec>,
}

impl Batch {
    /// Load a batch from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a batch from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse batch YAML")
    }

    /// Validate the batch definition.
    ///
    /// An empty task list is allowed: running it is the identity case.
    /// Runtime preconditions (e.g. a non-positive lookup id) are left to
    /// the run itself, where they classify as task failures.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Batch name cannot be empty");
        }

        let mut seen: Vec<&str> = Vec::new();
        for (i, spec) in self.tasks.iter().enumerate() {
            if spec.name.is_empty() {
                anyhow::bail!("Task {} has an empty name", i);
            }
            if seen.contains(&spec.name.as_str()) {
                anyhow::bail!("Duplicate task name '{}'", spec.name);
            }
            seen.push(&spec.name);
        }

        Ok(())
    }

    /// The run options implied by this batch
    pub fn options(&self) -> ExecuteOptions {
        ExecuteOptions {
            on_partial_failure: self.on_partial_failure,
        }
    }

    /// Lower every spec into a runnable task against the given transport
    pub fn build_tasks(&self, transport: Arc<dyn Transport>) -> Vec<Task<Value>> {
        self.tasks
            .iter()
            .map(|spec| spec.build(Arc::clone(&transport)))
            .collect()
    }
}

/// A single task in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task name (unique within the batch)
    pub name: String,

    /// What the task does
    #[serde(flatten)]
    pub kind: TaskKind,
}

impl TaskSpec {
    /// Build a runnable task from this spec
    pub fn build(&self, transport: Arc<dyn Transport>) -> Task<Value> {
        match &self.kind {
            TaskKind::Resource {
                resource,
                required_fields,
            } => resource_task(
                self.name.clone(),
                transport,
                resource.clone(),
                required_fields.clone(),
            ),
            TaskKind::Lookup { user_id, delay_ms } => {
                let user_id = *user_id;
                timer::after(
                    self.name.clone(),
                    Duration::from_millis(*delay_ms),
                    move || {
                        let record = lookup_user(user_id)?;
                        Ok(serde_json::to_value(record)?)
                    },
                )
            }
        }
    }
}

/// What a task does
///
/// Supports two YAML shapes:
/// - Resource fetch: `{ resource: users/1, required_fields: [name] }`
/// - Timer lookup: `{ user_id: 7, delay_ms: 1000 }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskKind {
    /// Fetch a resource through the transport and decode it
    Resource {
        resource: String,

        /// Fields that must be present and non-null in the decoded body
        #[serde(default)]
        required_fields: Vec<String>,
    },

    /// Simulated user lookup after a delay
    Lookup {
        user_id: i64,

        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
}

fn default_delay_ms() -> u64 {
    1000
}
