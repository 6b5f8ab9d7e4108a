//! Aggregated run results and classified failure details.
//!
//! Every exit path of a task is represented as data. Callers observe
//! failures only through these types, never through a propagated error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of failure kinds surfaced by a run.
///
/// Callers branch on the kind; messages are for humans only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The underlying call could not complete (network failure, non-2xx status)
    Transport,

    /// The response body could not be parsed into structured data
    Decode,

    /// Structured data was obtained but a required field was absent or null
    MissingField,

    /// A caller-supplied argument failed its precondition
    InvalidInput,
}

/// A classified, structured description of a task failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Which kind of failure this was
    pub kind: ErrorKind,

    /// Human-readable description (full context chain)
    pub message: String,

    /// Submission index of the task that produced it
    pub task_index: usize,

    /// Diagnostic name of the task that produced it
    pub task_name: String,
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task '{}' (#{}) failed ({:?}): {}",
            self.task_name, self.task_index, self.kind, self.message
        )
    }
}

/// How a single task in a batch settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settled<T> {
    /// The task produced a value
    Value(T),

    /// The task failed, classified
    Failed(ErrorDetail),
}

impl<T> Settled<T> {
    /// The produced value, if the task succeeded
    pub fn value(&self) -> Option<&T> {
        match self {
            Settled::Value(value) => Some(value),
            Settled::Failed(_) => None,
        }
    }

    /// The classified failure, if the task failed
    pub fn failure(&self) -> Option<&ErrorDetail> {
        match self {
            Settled::Value(_) => None,
            Settled::Failed(detail) => Some(detail),
        }
    }
}

/// The aggregated, classified result of one orchestrator run.
///
/// Result sequences are always in submission order, independent of
/// completion order. Sequential runs never produce `PartialFailure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Outcome<T> {
    /// Every task succeeded
    Success { values: Vec<T> },

    /// Some tasks failed; all results retained side by side
    PartialFailure {
        results: Vec<Settled<T>>,
        first_error: ErrorDetail,
    },

    /// The run halted on (or committed to) a single classified failure
    Failure { error: ErrorDetail },
}

impl<T> Outcome<T> {
    /// Check whether every task succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The failure a caller should report first, if any
    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::PartialFailure { first_error, .. } => Some(first_error),
            Outcome::Failure { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(kind: ErrorKind, index: usize) -> ErrorDetail {
        ErrorDetail {
            kind,
            message: "synthetic".to_string(),
            task_index: index,
            task_name: format!("task-{index}"),
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome: Outcome<i32> = Outcome::Success {
            values: vec![1, 2, 3],
        };

        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: Outcome<i32> = serde_json::from_str(&json).unwrap();

        assert!(json.contains("\"status\":\"success\""));
        assert_eq!(parsed, outcome);
    }

    #[test]
    fn test_failure_carries_detail() {
        let outcome: Outcome<i32> = Outcome::Failure {
            error: detail(ErrorKind::Transport, 2),
        };

        assert!(!outcome.is_success());
        let error = outcome.error().unwrap();
        assert_eq!(error.kind, ErrorKind::Transport);
        assert_eq!(error.task_index, 2);
    }

    #[test]
    fn test_partial_failure_reports_first_error() {
        let outcome: Outcome<i32> = Outcome::PartialFailure {
            results: vec![
                Settled::Value(1),
                Settled::Failed(detail(ErrorKind::Decode, 1)),
            ],
            first_error: detail(ErrorKind::Decode, 1),
        };

        assert_eq!(outcome.error().unwrap().kind, ErrorKind::Decode);
    }

    #[test]
    fn test_settled_accessors() {
        let ok: Settled<i32> = Settled::Value(7);
        let failed: Settled<i32> = Settled::Failed(detail(ErrorKind::MissingField, 0));

        assert_eq!(ok.value(), Some(&7));
        assert!(ok.failure().is_none());
        assert!(failed.value().is_none());
        assert_eq!(failed.failure().unwrap().kind, ErrorKind::MissingField);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MissingField).unwrap();
        assert_eq!(json, "\"missing_field\"");
    }
}
