//! Error types for the store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record body could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// No row with this id exists for the owner.
    #[error("{table}: no record {id} for this owner")]
    NotFound {
        /// Table searched.
        table: &'static str,
        /// Requested id.
        id: String,
    },

    /// A natural-key row references a parent the owner does not have, or has deleted.
    #[error("{table}: parent record {id} not found for this owner")]
    ParentNotFound {
        /// Parent table.
        table: &'static str,
        /// Parent id.
        id: String,
    },

    /// A natural-key column had no value.
    #[error("{table}: missing key column {column}")]
    MissingKey {
        /// Table written.
        table: &'static str,
        /// Column without a value.
        column: &'static str,
    },

    /// A stored row could not be read back.
    #[error("corrupt row in {table}: {message}")]
    Corrupt {
        /// Table read.
        table: &'static str,
        /// What was wrong.
        message: String,
    },
}

impl StoreError {
    /// Returns true if the error concerns a single record rather than
    /// the store as a whole.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. }
                | StoreError::ParentNotFound { .. }
                | StoreError::MissingKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors() {
        let err = StoreError::NotFound {
            table: "habits",
            id: "abc".into(),
        };
        assert!(err.is_record_error());
        assert!(err.to_string().contains("habits"));
        assert!(!StoreError::Migration("boom".into()).is_record_error());
    }
}
