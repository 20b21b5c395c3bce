//! Error types for the sync engine.

use dayline_core::CoreError;
use dayline_store::StoreError;
use dayline_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the sync engine.
///
/// Item-scoped errors become the `error` of a single push result; the
/// rest fail the whole request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No kind is registered under the tag.
    #[error("Unknown item type: {0}")]
    UnknownKind(String),

    /// A kind with the same tag or bucket is already registered.
    #[error("kind already registered: {0}")]
    DuplicateKind(String),

    /// The `data` object does not match the kind's shape.
    #[error("invalid {kind} data: {message}")]
    MalformedPayload {
        /// Kind tag.
        kind: &'static str,
        /// Decoder message.
        message: String,
    },

    /// The payload decoded but breaks a field constraint.
    #[error("invalid {kind} data: {source}")]
    Validation {
        /// Kind tag.
        kind: &'static str,
        /// Failed constraint.
        source: CoreError,
    },

    /// The `serverId` is not a valid identifier.
    #[error("invalid server id {0:?}")]
    InvalidServerId(String),

    /// Batch-level protocol rule violated.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// Store failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns true if the error concerns one push item only.
    pub fn is_item_error(&self) -> bool {
        match self {
            EngineError::UnknownKind(_)
            | EngineError::MalformedPayload { .. }
            | EngineError::Validation { .. }
            | EngineError::InvalidServerId(_) => true,
            EngineError::Store(e) => e.is_record_error(),
            EngineError::DuplicateKind(_) | EngineError::Protocol(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_errors() {
        assert!(EngineError::UnknownKind("sleep".into()).is_item_error());
        assert!(EngineError::InvalidServerId("x".into()).is_item_error());
        assert!(EngineError::Store(StoreError::NotFound {
            table: "habits",
            id: "x".into()
        })
        .is_item_error());
        assert!(!EngineError::Store(StoreError::Migration("x".into())).is_item_error());
        assert!(!EngineError::Protocol(ProtocolError::invalid("No items to sync")).is_item_error());
    }

    #[test]
    fn unknown_kind_message() {
        let err = EngineError::UnknownKind("sleep".into());
        assert_eq!(err.to_string(), "Unknown item type: sleep");
    }

    #[test]
    fn protocol_message_is_passed_through() {
        let err = EngineError::from(ProtocolError::invalid("No items to sync"));
        assert_eq!(err.to_string(), "invalid message: No items to sync");
    }
}
