//! Scheduler error types.

use thiserror::Error;

/// A malformed scheduler argument, raised before any task is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgument(pub String);

/// Outcome of a failed [`throttle_all`](crate::throttle_all) call.
#[derive(Debug, Error)]
pub enum ThrottleError<E> {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// The first task failure observed, carried as-is.
    #[error("{0}")]
    Task(E),
}

impl<E> ThrottleError<E> {
    /// The task's own error, if the failure came from a task.
    pub fn into_task_error(self) -> Option<E> {
        match self {
            ThrottleError::Task(err) => Some(err),
            ThrottleError::InvalidArgument(_) => None,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ThrottleError::InvalidArgument(_))
    }
}
