//! Schema migrations.
//!
//! Migrations run in order and are tracked in the `migrations` table.

use crate::error::{StoreError, StoreResult};
use crate::schema::tables;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Runs all pending migrations.
pub fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = schema_version(conn)?;
    if current_version > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current_version} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version < 1 {
        migrate_v1_record_tables(conn)?;
    }
    if current_version < 2 {
        migrate_v2_live_row_indexes(conn)?;
    }

    info!("Migrations complete");
    Ok(())
}

/// Returns the highest applied migration, or 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> StoreResult<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'migrations')",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(0);
    }
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: one table per record kind.
fn migrate_v1_record_tables(conn: &Connection) -> StoreResult<()> {
    info!("Applying migration v1: record tables");

    for table in tables::ALL {
        conn.execute_batch(&table.create_sql())?;
    }

    record_migration(conn, 1, "record_tables")
}

/// V2: partial indexes for current-state reads.
fn migrate_v2_live_row_indexes(conn: &Connection) -> StoreResult<()> {
    info!("Applying migration v2: live row indexes");

    for table in tables::ALL {
        conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{name}_owner_live
                ON {name}(owner_id, created_at) WHERE is_deleted = 0;",
            name = table.name,
        ))?;
    }

    record_migration(conn, 2, "live_row_indexes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_migrates_to_current() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);

        for table in tables::ALL {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, i64::from(CURRENT_VERSION));
    }

    #[test]
    fn refuses_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        record_migration(&conn, CURRENT_VERSION + 1, "from_the_future").unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(matches!(err, StoreError::Migration(_)));
    }
}
