//! Serve command implementation.

use crate::error::CliResult;
use dayline_sync_server::{http, ServerConfig};
use tracing::info;

/// Runs the HTTP sync server until interrupted.
pub fn run(config: ServerConfig) -> CliResult<()> {
    match &config.database_path {
        Some(path) => info!("Serving {:?} on {}", path, config.bind_addr),
        None => info!("Serving an in-memory database on {}", config.bind_addr),
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(http::serve(config))?;
    Ok(())
}
