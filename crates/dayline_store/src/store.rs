//! Store handle and transactions.

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::rows;
use crate::schema::{tables, TableSpec};
use chrono::{DateTime, Utc};
use dayline_core::{Clock, Cursor, OwnerId};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Handle to the record database.
///
/// All access goes through [`Store::read`] or [`Store::write`], which run
/// a closure inside a transaction while holding the connection lock.
/// Writes are stamped and cursors captured with the same [`Clock`] under
/// that lock, so a cursor taken by a read is strictly greater than every
/// timestamp committed before it and strictly smaller than every
/// timestamp committed after it. This holds for writes made through the
/// same `Store`; another process writing the same file has its own lock
/// and clock.
pub struct Store {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Opens a database file, creating it and running migrations if needed.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
        ",
        )?;
        migrations::run_migrations(&conn)?;

        debug!(path = %path.display(), "Opened store");
        Ok(Self::from_connection(conn, clock))
    }

    /// Opens an in-memory database.
    pub fn open_in_memory(clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self::from_connection(conn, clock))
    }

    /// Reads the schema version of a database file without migrating it.
    ///
    /// Returns 0 for a file that has never been migrated.
    pub fn version_at(path: impl AsRef<Path>) -> StoreResult<i32> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        migrations::schema_version(&conn)
    }

    fn from_connection(conn: Connection, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn: Mutex::new(conn),
            clock,
        }
    }

    /// Returns the clock that stamps writes.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Runs `f` inside a read transaction.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
    {
        self.run(TransactionBehavior::Deferred, f)
    }

    /// Runs `f` inside a write transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
    {
        self.run(TransactionBehavior::Immediate, f)
    }

    fn run<T, E, F>(&self, behavior: TransactionBehavior, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Tx<'_>) -> Result<T, E>,
    {
        let mut conn = self.conn.lock();
        let inner = conn
            .transaction_with_behavior(behavior)
            .map_err(StoreError::from)?;
        let tx = Tx {
            inner,
            clock: self.clock.as_ref(),
        };
        let value = f(&tx)?;
        tx.inner.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    /// Returns the applied schema version.
    pub fn schema_version(&self) -> StoreResult<i32> {
        let conn = self.conn.lock();
        migrations::schema_version(&conn)
    }

    /// Counts live rows and tombstones per built-in table.
    ///
    /// With `owner` set, only that owner's rows are counted.
    pub fn counts(&self, owner: Option<OwnerId>) -> StoreResult<Vec<TableCounts>> {
        self.read(|tx| {
            tables::ALL
                .iter()
                .map(|table| TableCounts::collect(tx, table, owner))
                .collect()
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

/// An open transaction.
///
/// Dereferences to the underlying connection for row operations.
pub struct Tx<'a> {
    inner: Transaction<'a>,
    clock: &'a dyn Clock,
}

impl Tx<'_> {
    /// Reads the store clock.
    ///
    /// Every call returns a later instant than the previous one when the
    /// store runs on a [`SystemClock`](dayline_core::SystemClock).
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Captures a sync cursor.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.now())
    }
}

impl Deref for Tx<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.inner
    }
}

/// Row counts for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    /// Table name.
    pub table: &'static str,
    /// Rows not marked deleted.
    pub live: u64,
    /// Rows marked deleted.
    pub tombstones: u64,
}

impl TableCounts {
    fn collect(tx: &Tx<'_>, table: &TableSpec, owner: Option<OwnerId>) -> StoreResult<Self> {
        let (live, tombstones) = rows::count(tx, table, owner)?;
        Ok(Self {
            table: table.name,
            live,
            tombstones,
        })
    }

    /// Total rows, live and deleted.
    pub fn total(&self) -> u64 {
        self.live + self.tombstones
    }
}
