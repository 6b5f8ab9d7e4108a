//! Deferred units of asynchronous work.
//!
//! A Task is a pure description: nothing runs until the orchestrator
//! invokes it, and invocation consumes the Task, so a single instance
//! can never be run twice.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

/// The in-flight form of a task's work.
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// A single deferred unit of asynchronous work producing a `T`.
///
/// The wrapped work is supplied by the caller (a network call, a timer,
/// a computation) and reports its raw failure as `anyhow::Error`; the
/// orchestrator classifies it before anything leaves the run.
pub struct Task<T> {
    /// Diagnostic name, carried into error details and logs
    name: String,

    /// Zero-argument invocation handle; not called until `run()`
    work: Box<dyn FnOnce() -> TaskFuture<T> + Send>,
}

impl<T> Task<T> {
    /// Wrap a closure producing a future into a named task.
    pub fn new<F, Fut>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            name: name.into(),
            work: Box::new(move || {
                let fut: TaskFuture<T> = Box::pin(work());
                fut
            }),
        }
    }

    /// Diagnostic name of this task
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the underlying work.
    ///
    /// Consumes the task; retrying means constructing a fresh one.
    pub fn run(self) -> TaskFuture<T> {
        (self.work)()
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}
