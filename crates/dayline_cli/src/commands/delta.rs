//! Delta command implementation.

use super::{open_engine, parse_owner, print_json};
use crate::error::{CliError, CliResult};
use dayline_core::Cursor;
use dayline_sync_protocol::DeltaResponse;
use serde_json::Value;
use std::path::Path;

/// Parses a cursor as printed in `lastSyncTimestamp`.
pub fn parse_cursor(value: &str) -> CliResult<Cursor> {
    serde_json::from_value(Value::String(value.to_string())).map_err(|_| {
        CliError::InvalidArgument(format!("since must be an RFC 3339 timestamp, got {value:?}"))
    })
}

/// Reads an owner's changes after `since`, or everything without it.
pub fn execute(path: &Path, owner: &str, since: Option<&str>) -> CliResult<DeltaResponse> {
    let owner = parse_owner(owner)?;
    let since = since.map(parse_cursor).transpose()?.unwrap_or(Cursor::EPOCH);
    Ok(open_engine(path)?.delta(owner, since)?)
}

/// Runs the delta command, printing the response as JSON.
pub fn run(path: &Path, owner: &str, since: Option<&str>) -> CliResult<()> {
    print_json(&execute(path, owner, since)?)
}
