//! Timer-based task construction.
//!
//! `after` is the timer capability: run a computation once a delay has
//! elapsed. On top of it sits a simulated user directory lookup, which
//! resolves a record for a positive id and fails with an invalid-input
//! error otherwise. The id check runs after the delay, matching a
//! lookup service that validates on arrival.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::classify::TaskError;
use crate::domain::Task;

/// A user record produced by the simulated lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
}

/// Build a task that produces a value once `delay` has elapsed
pub fn after<T, F>(name: impl Into<String>, delay: Duration, produce: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    Task::new(name, move || async move {
        tokio::time::sleep(delay).await;
        produce()
    })
}

/// Resolve a user record for a positive id
pub fn lookup_user(user_id: i64) -> Result<UserRecord> {
    if user_id <= 0 {
        return Err(TaskError::InvalidInput {
            reason: format!("user id must be positive, got {}", user_id),
        }
        .into());
    }

    Ok(UserRecord {
        id: user_id,
        name: format!("user-{}", user_id),
    })
}

/// Build a delayed user-lookup task
pub fn user_lookup_task(name: impl Into<String>, user_id: i64, delay: Duration) -> Task<UserRecord> {
    after(name, delay, move || lookup_user(user_id))
}
