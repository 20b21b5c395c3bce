//! Row operations.
//!
//! Every function takes the owner it acts for and never reads or touches
//! another owner's rows.

use crate::error::{StoreError, StoreResult};
use crate::schema::{tables, TableSpec};
use crate::store::Tx;
use chrono::{DateTime, SecondsFormat, Utc};
use dayline_core::{date, Cursor, NaturalKey, OwnerId, ServerId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde_json::{Map, Value};
use tracing::trace;

/// Values written for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RowData {
    /// Natural-key values; only those the table layout names are stored.
    pub key: NaturalKey,
    /// Kind-specific fields as a JSON object.
    pub body: Value,
}

impl RowData {
    /// Creates row data for an identity-addressed record.
    pub fn new(body: Value) -> Self {
        Self {
            key: NaturalKey::default(),
            body,
        }
    }

    /// Creates row data carrying natural-key values.
    pub fn keyed(key: NaturalKey, body: Value) -> Self {
        Self { key, body }
    }

    fn key_values(&self, table: &TableSpec) -> StoreResult<Vec<SqlValue>> {
        table
            .key
            .columns()
            .iter()
            .map(|column| {
                let value = match *column {
                    "parent_id" => self
                        .key
                        .parent_id
                        .map(|id| SqlValue::Text(id.to_string())),
                    "date" => self.key.date.map(|d| SqlValue::Text(date::format(&d))),
                    "dose_number" => self.key.dose_number.map(SqlValue::Integer),
                    _ => None,
                };
                value.ok_or(StoreError::MissingKey {
                    table: table.name,
                    column,
                })
            })
            .collect()
    }
}

/// Which rows a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFilter {
    /// Include rows marked deleted.
    pub include_deleted: bool,
    /// Only rows with `updated_at` strictly after this cursor.
    pub since: Option<Cursor>,
}

impl RowFilter {
    /// Every row, tombstones included.
    pub fn all() -> Self {
        Self {
            include_deleted: true,
            since: None,
        }
    }

    /// Every row changed strictly after `since`, tombstones included.
    pub fn changed_since(since: Cursor) -> Self {
        Self {
            include_deleted: true,
            since: Some(since),
        }
    }

    /// Live rows only.
    pub fn current() -> Self {
        Self {
            include_deleted: false,
            since: None,
        }
    }
}

/// A row as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    /// Server id.
    pub id: ServerId,
    /// Owning identity.
    pub owner: OwnerId,
    /// Kind-specific fields.
    pub body: Value,
    /// Tombstone flag.
    pub is_deleted: bool,
    /// First insert.
    pub created_at: DateTime<Utc>,
    /// Last write, including tombstoning.
    pub updated_at: DateTime<Utc>,
}

impl StoredRow {
    /// Flattens the row into the record object sent to clients.
    ///
    /// Body fields come first; the common fields overwrite any body field
    /// of the same name.
    pub fn into_record(self) -> Value {
        let mut record = match self.body {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        record.insert("id".to_string(), Value::String(self.id.to_string()));
        record.insert("user_id".to_string(), Value::String(self.owner.to_string()));
        record.insert("is_deleted".to_string(), Value::Bool(self.is_deleted));
        record.insert("created_at".to_string(), timestamp(self.created_at));
        record.insert("updated_at".to_string(), timestamp(self.updated_at));
        Value::Object(record)
    }

    fn from_row(table: &'static str, row: &Row<'_>) -> StoreResult<Self> {
        let corrupt = |message: String| StoreError::Corrupt { table, message };

        let id: String = row.get(0)?;
        let owner: String = row.get(1)?;
        let body: String = row.get(2)?;
        let created_at: i64 = row.get(4)?;
        let updated_at: i64 = row.get(5)?;

        Ok(Self {
            id: id.parse().map_err(|e| corrupt(format!("{e}")))?,
            owner: owner.parse().map_err(|e| corrupt(format!("{e}")))?,
            body: serde_json::from_str(&body)?,
            is_deleted: row.get(3)?,
            created_at: DateTime::from_timestamp_micros(created_at)
                .ok_or_else(|| corrupt(format!("created_at {created_at} out of range")))?,
            updated_at: DateTime::from_timestamp_micros(updated_at)
                .ok_or_else(|| corrupt(format!("updated_at {updated_at} out of range")))?,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

const COLUMNS: &str = "id, owner_id, body, is_deleted, created_at, updated_at";

/// Inserts a new record and returns its id.
///
/// For tables with a natural key this is an [`upsert`]: a row already
/// holding the key is revived and overwritten, keeping its id.
pub fn insert(
    tx: &Tx<'_>,
    table: &TableSpec,
    owner: OwnerId,
    data: &RowData,
) -> StoreResult<ServerId> {
    if table.key.is_keyed() {
        return upsert(tx, table, owner, data);
    }

    let id = ServerId::new();
    let now = tx.now().timestamp_micros();
    let body = serde_json::to_string(&data.body)?;
    tx.prepare_cached(&format!(
        "INSERT INTO {} ({COLUMNS}) VALUES (?1, ?2, ?3, 0, ?4, ?4)",
        table.name
    ))?
    .execute(params![id.to_string(), owner.to_string(), body, now])?;

    trace!(table = table.name, %id, "Inserted row");
    Ok(id)
}

/// Overwrites the body of an existing record.
///
/// The tombstone flag is left as it is.
pub fn update(
    tx: &Tx<'_>,
    table: &TableSpec,
    owner: OwnerId,
    id: ServerId,
    data: &RowData,
) -> StoreResult<()> {
    let key_values = data.key_values(table)?;
    let assignments: String = table
        .key
        .columns()
        .iter()
        .map(|column| format!(", {column} = ?"))
        .collect();

    let mut values = vec![
        SqlValue::Text(serde_json::to_string(&data.body)?),
        SqlValue::Integer(tx.now().timestamp_micros()),
    ];
    values.extend(key_values);
    values.push(SqlValue::Text(id.to_string()));
    values.push(SqlValue::Text(owner.to_string()));

    let changed = tx
        .prepare_cached(&format!(
            "UPDATE {} SET body = ?, updated_at = ?{assignments} WHERE id = ? AND owner_id = ?",
            table.name
        ))?
        .execute(params_from_iter(values))?;

    if changed == 0 {
        return Err(StoreError::NotFound {
            table: table.name,
            id: id.to_string(),
        });
    }
    trace!(table = table.name, %id, "Updated row");
    Ok(())
}

/// Inserts or replaces the row holding the natural key of `data`.
///
/// A replaced row keeps its id and `created_at`, is revived if it was
/// tombstoned, and gets a fresh `updated_at`. Parent references must name
/// a live row the owner has.
pub fn upsert(
    tx: &Tx<'_>,
    table: &TableSpec,
    owner: OwnerId,
    data: &RowData,
) -> StoreResult<ServerId> {
    if let (Some(parent), Some(parent_id)) = (table.key.parent(), data.key.parent_id) {
        let exists: bool = tx
            .prepare_cached(&format!(
                "SELECT EXISTS (SELECT 1 FROM {parent} WHERE id = ?1 AND owner_id = ?2 AND is_deleted = 0)"
            ))?
            .query_row(params![parent_id.to_string(), owner.to_string()], |row| {
                row.get(0)
            })?;
        if !exists {
            return Err(StoreError::ParentNotFound {
                table: parent,
                id: parent_id.to_string(),
            });
        }
    }

    let key_values = data.key_values(table)?;
    let key_columns = table.key.columns();
    let conflict: Vec<&str> = std::iter::once("owner_id")
        .chain(key_columns.iter().copied())
        .collect();
    let extra_columns: String = key_columns.iter().map(|c| format!(", {c}")).collect();
    let extra_params: String = key_columns.iter().map(|_| ", ?").collect();

    let mut values = vec![
        SqlValue::Text(ServerId::new().to_string()),
        SqlValue::Text(owner.to_string()),
        SqlValue::Text(serde_json::to_string(&data.body)?),
        SqlValue::Integer(tx.now().timestamp_micros()),
    ];
    values.extend(key_values);

    let id: String = tx
        .prepare_cached(&format!(
            "INSERT INTO {table} (id, owner_id, body, is_deleted, created_at, updated_at{extra_columns})
             VALUES (?1, ?2, ?3, 0, ?4, ?4{extra_params})
             ON CONFLICT ({conflict}) DO UPDATE SET
                body = excluded.body,
                is_deleted = 0,
                updated_at = excluded.updated_at
             RETURNING id",
            table = table.name,
            conflict = conflict.join(", "),
        ))?
        .query_row(params_from_iter(values), |row| row.get(0))?;

    let id = id.parse().map_err(|e| StoreError::Corrupt {
        table: table.name,
        message: format!("{e}"),
    })?;
    trace!(table = table.name, %id, "Upserted row");
    Ok(id)
}

/// Marks a record deleted and bumps its `updated_at`.
///
/// Tombstoning an already deleted row succeeds and bumps it again.
pub fn tombstone(tx: &Tx<'_>, table: &TableSpec, owner: OwnerId, id: ServerId) -> StoreResult<()> {
    let changed = tx
        .prepare_cached(&format!(
            "UPDATE {} SET is_deleted = 1, updated_at = ?1 WHERE id = ?2 AND owner_id = ?3",
            table.name
        ))?
        .execute(params![
            tx.now().timestamp_micros(),
            id.to_string(),
            owner.to_string()
        ])?;

    if changed == 0 {
        return Err(StoreError::NotFound {
            table: table.name,
            id: id.to_string(),
        });
    }
    trace!(table = table.name, %id, "Tombstoned row");
    Ok(())
}

/// Deletes a record and every child row referencing it.
///
/// Returns false if the owner had no such record.
pub fn remove(tx: &Tx<'_>, table: &TableSpec, owner: OwnerId, id: ServerId) -> StoreResult<bool> {
    let owner_text = owner.to_string();
    let id_text = id.to_string();

    for child in tables::ALL
        .iter()
        .filter(|child| child.key.parent() == Some(table.name))
    {
        tx.prepare_cached(&format!(
            "DELETE FROM {} WHERE parent_id = ?1 AND owner_id = ?2",
            child.name
        ))?
        .execute(params![id_text, owner_text])?;
    }

    let removed = tx
        .prepare_cached(&format!(
            "DELETE FROM {} WHERE id = ?1 AND owner_id = ?2",
            table.name
        ))?
        .execute(params![id_text, owner_text])?;

    trace!(table = table.name, %id, removed, "Removed row");
    Ok(removed > 0)
}

/// Reads one record.
pub fn get(
    tx: &Tx<'_>,
    table: &TableSpec,
    owner: OwnerId,
    id: ServerId,
) -> StoreResult<Option<StoredRow>> {
    let mut stmt = tx.prepare_cached(&format!(
        "SELECT {COLUMNS} FROM {} WHERE id = ?1 AND owner_id = ?2",
        table.name
    ))?;
    let row = stmt
        .query_row(params![id.to_string(), owner.to_string()], |row| {
            Ok(StoredRow::from_row(table.name, row))
        })
        .optional()?;
    row.transpose()
}

/// Lists the owner's records in insertion order.
pub fn select(
    tx: &Tx<'_>,
    table: &TableSpec,
    owner: OwnerId,
    filter: &RowFilter,
) -> StoreResult<Vec<StoredRow>> {
    let mut sql = format!("SELECT {COLUMNS} FROM {} WHERE owner_id = ?", table.name);
    let mut values = vec![SqlValue::Text(owner.to_string())];
    if !filter.include_deleted {
        sql.push_str(" AND is_deleted = 0");
    }
    if let Some(since) = filter.since {
        sql.push_str(" AND updated_at > ?");
        values.push(SqlValue::Integer(since.as_micros()));
    }
    sql.push_str(" ORDER BY created_at, id");

    let mut stmt = tx.prepare_cached(&sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(StoredRow::from_row(table.name, row)?);
    }
    Ok(out)
}

/// Counts live rows and tombstones, for one owner or for everyone.
pub fn count(tx: &Tx<'_>, table: &TableSpec, owner: Option<OwnerId>) -> StoreResult<(u64, u64)> {
    let totals = |row: &Row<'_>| -> rusqlite::Result<(i64, i64)> { Ok((row.get(0)?, row.get(1)?)) };
    let select = format!(
        "SELECT COALESCE(SUM(is_deleted = 0), 0), COALESCE(SUM(is_deleted = 1), 0) FROM {}",
        table.name
    );

    let (live, tombstones) = match owner {
        Some(owner) => tx
            .prepare_cached(&format!("{select} WHERE owner_id = ?1"))?
            .query_row(params![owner.to_string()], totals)?,
        None => tx.prepare_cached(&select)?.query_row([], totals)?,
    };
    Ok((
        u64::try_from(live).unwrap_or_default(),
        u64::try_from(tombstones).unwrap_or_default(),
    ))
}

