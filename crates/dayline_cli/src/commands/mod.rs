//! CLI command implementations.

pub mod delta;
pub mod inspect;
pub mod migrate;
pub mod push;
pub mod serve;
pub mod snapshot;
pub mod token;

use crate::error::{CliError, CliResult};
use dayline_core::{OwnerId, SystemClock};
use dayline_store::Store;
use dayline_sync_engine::SyncEngine;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Parses an owner id argument.
pub fn parse_owner(value: &str) -> CliResult<OwnerId> {
    value
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("owner must be a UUID, got {value:?}")))
}

/// Opens an existing database file.
pub fn open_store(path: &Path) -> CliResult<Store> {
    if !path.exists() {
        return Err(CliError::DatabaseMissing(path.display().to_string()));
    }
    Ok(Store::open(path, Arc::new(SystemClock::new()))?)
}

/// Opens an engine over an existing database file.
pub fn open_engine(path: &Path) -> CliResult<SyncEngine> {
    Ok(SyncEngine::new(Arc::new(open_store(path)?)))
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
