//! Failure classification.
//!
//! Raw failures are caught at the task boundary as `anyhow::Error` and
//! mapped here into the closed `ErrorKind` taxonomy before they are
//! stored in an outcome. Classification is total: every input produces
//! exactly one `ErrorDetail`.

use thiserror::Error;

use crate::domain::{ErrorDetail, ErrorKind};

/// Typed task failures raised by the crate's own task helpers.
///
/// Task bodies supplied by callers may fail with any `anyhow::Error`;
/// these variants exist so the classifier can recover the kind without
/// string-matching messages.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("transport failure for '{identifier}': {reason}")]
    Transport { identifier: String, reason: String },

    #[error("unexpected status {status} for '{identifier}'")]
    Status { identifier: String, status: u16 },

    #[error("failed to decode response body: {reason}")]
    Decode { reason: String },

    #[error("required field '{field}' missing or null")]
    MissingField { field: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl TaskError {
    /// The taxonomy kind this error classifies as
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::Transport { .. } | TaskError::Status { .. } => ErrorKind::Transport,
            TaskError::Decode { .. } => ErrorKind::Decode,
            TaskError::MissingField { .. } => ErrorKind::MissingField,
            TaskError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// Map a raw task failure to a classified `ErrorDetail`.
///
/// Downcast chain: the crate's own `TaskError` first, then the transport
/// and decode library errors, and finally `Transport` as the
/// could-not-complete bucket for anything unrecognized.
pub fn classify(task_index: usize, task_name: &str, error: &anyhow::Error) -> ErrorDetail {
    let kind = if let Some(task_error) = error.downcast_ref::<TaskError>() {
        task_error.kind()
    } else if let Some(transport_error) = error.downcast_ref::<reqwest::Error>() {
        if transport_error.is_decode() {
            ErrorKind::Decode
        } else {
            ErrorKind::Transport
        }
    } else if error.downcast_ref::<serde_json::Error>().is_some() {
        ErrorKind::Decode
    } else {
        ErrorKind::Transport
    };

    ErrorDetail {
        kind,
        message: format!("{error:#}"),
        task_index,
        task_name: task_name.to_string(),
    }
}
