//! Error types for the sync server.

use dayline_sync_engine::EngineError;
use dayline_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that fail a whole request.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No usable caller identity.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Unknown route.
    #[error("not found: {0}")]
    NotFound(String),

    /// Known route, wrong method.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Store failure.
    #[error("database error: {0}")]
    Database(String),

    /// The request ran past its deadline.
    #[error("request timed out")]
    Timeout,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::AuthenticationFailed(_)
                | ServerError::NotFound(_)
                | ServerError::MethodNotAllowed { .. }
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::AuthenticationFailed(_) => 401,
            ServerError::NotFound(_) => 404,
            ServerError::MethodNotAllowed { .. } => 405,
            ServerError::Timeout => 503,
            ServerError::Database(_) | ServerError::Internal(_) | ServerError::Io(_) => 500,
        }
    }
}

impl From<ProtocolError> for ServerError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Malformed(e) => ServerError::InvalidRequest(e.to_string()),
            ProtocolError::Invalid(message) => ServerError::InvalidRequest(message),
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Protocol(e) => e.into(),
            EngineError::Store(e) => ServerError::Database(e.to_string()),
            e if e.is_item_error() => ServerError::InvalidRequest(e.to_string()),
            e => ServerError::Internal(e.to_string()),
        }
    }
}
