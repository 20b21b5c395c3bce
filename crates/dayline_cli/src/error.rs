//! CLI error type.

use dayline_store::StoreError;
use dayline_sync_engine::EngineError;
use dayline_sync_protocol::ProtocolError;
use dayline_sync_server::ServerError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors a command can end with.
#[derive(Error, Debug)]
pub enum CliError {
    /// The command needs `--db` or `DAYLINE_DB`.
    #[error("database path required for {0} (use --db or DAYLINE_DB)")]
    DatabaseRequired(&'static str),

    /// The database file does not exist.
    #[error("no database found at {0}")]
    DatabaseMissing(String),

    /// A command argument could not be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Protocol error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Engine error.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Server error.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// JSON output error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
