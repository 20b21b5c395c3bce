//! Migrate command implementation.

use crate::error::CliResult;
use dayline_core::SystemClock;
use dayline_store::Store;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Migration result.
#[derive(Debug, Serialize)]
pub struct MigrateResult {
    /// Database path.
    pub path: String,
    /// Schema version before the command ran.
    pub from_version: i32,
    /// Schema version after the command ran.
    pub to_version: i32,
}

/// Creates or upgrades the database schema.
pub fn execute(path: &Path) -> CliResult<MigrateResult> {
    let from_version = if path.exists() {
        Store::version_at(path)?
    } else {
        0
    };

    info!("Migrating {:?} from v{}", path, from_version);
    let store = Store::open(path, Arc::new(SystemClock::new()))?;

    Ok(MigrateResult {
        path: path.display().to_string(),
        from_version,
        to_version: store.schema_version()?,
    })
}

/// Runs the migrate command.
pub fn run(path: &Path) -> CliResult<()> {
    let result = execute(path)?;
    if result.from_version == result.to_version {
        println!("{} is up to date (schema v{})", result.path, result.to_version);
    } else {
        println!(
            "Migrated {} from schema v{} to v{}",
            result.path, result.from_version, result.to_version
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayline_store::CURRENT_VERSION;
    use tempfile::TempDir;

    #[test]
    fn creates_then_reports_up_to_date() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dayline.db");

        let first = execute(&path).unwrap();
        assert_eq!(first.from_version, 0);
        assert_eq!(first.to_version, CURRENT_VERSION);

        let second = execute(&path).unwrap();
        assert_eq!(second.from_version, CURRENT_VERSION);
        assert_eq!(second.to_version, CURRENT_VERSION);
    }
}
