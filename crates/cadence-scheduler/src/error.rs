//! Error types for the scheduler.

use cadence_core::{CoreError, ValidationError};
use thiserror::Error;

/// Errors that can occur in scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The schedule failed validation; nothing was sent to the scheduler.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Task not found.
    #[error("task not found: {0}")]
    NotFound(String),

    /// The scheduler rejected or failed an operation.
    #[error("{operation} failed for task {task}: {message}")]
    Operation {
        operation: &'static str,
        task: String,
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Task store could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchedulerError {
    pub(crate) fn operation(
        operation: &'static str,
        task: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SchedulerError::Operation {
            operation,
            task: task.into(),
            message: message.into(),
        }
    }
}

impl From<CoreError> for SchedulerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(err) => SchedulerError::Validation(err),
            other => SchedulerError::operation("compile", "", other.to_string()),
        }
    }
}
