//! Snapshot command implementation.

use super::{open_engine, parse_owner, print_json};
use crate::error::CliResult;
use dayline_sync_protocol::SnapshotResponse;
use std::path::Path;

/// Reads an owner's complete state.
pub fn execute(path: &Path, owner: &str) -> CliResult<SnapshotResponse> {
    let owner = parse_owner(owner)?;
    Ok(open_engine(path)?.snapshot(owner)?)
}

/// Runs the snapshot command, printing the response as JSON.
pub fn run(path: &Path, owner: &str) -> CliResult<()> {
    print_json(&execute(path, owner)?)
}
