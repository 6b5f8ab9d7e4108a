//! fanout - Policy-driven async task orchestrator
//!
//! Runs one or more deferred asynchronous tasks under an explicit
//! concurrency policy and folds every settlement into a single,
//! classified outcome.
//!
//! # Architecture
//!
//! The system is built around three pieces:
//! - A Task is a pure description of one unit of async work
//! - The Orchestrator drives a batch of Tasks per policy (sequential
//!   or concurrent, fail-fast or collect-all)
//! - The classifier maps every raw failure into a closed taxonomy
//!   before it reaches the caller
//!
//! Failures are data: callers observe them only through `Outcome`
//! variants, never through a propagated error or an unhandled panic.
//!
//! # Modules
//!
//! - `adapters`: External capabilities (HTTP transport, timers)
//! - `core`: Orchestration logic (Orchestrator, classifier, Batch)
//! - `domain`: Data structures (Task, Outcome, ErrorDetail)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run a batch file
//! fanout run batch.yaml
//!
//! # Fetch three resources concurrently, keeping every result
//! fanout fetch users/1 users/2 users/3 --concurrent --collect-all
//!
//! # Simulated lookups: ~1s sequential per task, ~1s total concurrent
//! fanout lookup 1 2 3 --concurrent
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::adapters::{HttpTransport, Transport, TransportResponse};
pub use crate::core::{Batch, ExecuteOptions, Orchestrator, PartialFailureMode, Policy, TaskError};
pub use crate::domain::{ErrorDetail, ErrorKind, Outcome, Settled, Task, TaskFuture};
