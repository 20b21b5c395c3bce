//! Error types for dayline core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while parsing or validating domain values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An identifier was not a valid UUID.
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidId {
        /// The rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A calendar date could not be parsed.
    #[error("invalid date {0:?}: expected YYYY-MM-DD or RFC 3339")]
    InvalidDate(String),

    /// A timestamp could not be represented.
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    /// A payload field failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl CoreError {
    /// Creates a validation error for a field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
