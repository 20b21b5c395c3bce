//! Push command implementation.

use super::{open_engine, parse_owner, print_json};
use crate::error::CliResult;
use dayline_sync_protocol::{decode, PushRequest, PushResponse};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Applies a push request read from JSON bytes.
pub fn execute(path: &Path, owner: &str, input: &[u8]) -> CliResult<PushResponse> {
    let owner = parse_owner(owner)?;
    let request: PushRequest = decode(input)?;
    let response = open_engine(path)?.push(owner, &request)?;
    info!(
        items = response.results.len(),
        failed = response.failures(),
        "Applied push"
    );
    Ok(response)
}

/// Runs the push command.
///
/// Reads the request from `file`, or from stdin when no file is given.
pub fn run(path: &Path, owner: &str, file: Option<&Path>) -> CliResult<()> {
    let input = match file {
        Some(file) => std::fs::read(file)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    print_json(&execute(path, owner, &input)?)
}
