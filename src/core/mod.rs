//! Core orchestration logic.
//!
//! This module contains:
//! - Orchestrator: Main execution engine
//! - Classify: Failure classification into the closed taxonomy
//! - Batch: Batch definitions and loading

pub mod batch;
pub mod classify;
pub mod orchestrator;

// Re-export commonly used types
pub use batch::{Batch, TaskKind, TaskSpec};
pub use classify::{classify, TaskError};
pub use orchestrator::{ExecuteOptions, Orchestrator, PartialFailureMode, Policy};
