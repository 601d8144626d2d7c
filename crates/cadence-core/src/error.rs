//! Error types for schedule compilation.

use thiserror::Error;

use crate::validator::ValidationError;

/// Errors that can occur while validating, compiling or comparing schedules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The schedule was rejected before compilation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A duration string could not be parsed.
    #[error("invalid duration '{0}': expected an ISO-8601 duration such as PT72H")]
    Duration(String),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
