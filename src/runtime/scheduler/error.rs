//! Scheduler errors and fault capture

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use super::task::TaskId;

/// Misuse of the scheduler API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The id does not belong to a running task. Usually a stale id kept
    /// after the task finished.
    #[error("{0} is not running")]
    NotRunning(TaskId),

    /// The raw value can never be a task id.
    #[error("invalid task id: {0}")]
    InvalidId(i32),
}

/// Run user code, turning a panic into an error.
///
/// This is the single place where routine, predicate and liveness failures
/// are captured, so nothing unwinds through a tick.
pub(crate) fn catch_fault<R>(f: impl FnOnce() -> anyhow::Result<R>) -> anyhow::Result<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
