//! Write policies.
//!
//! Every kind is served by an [`EntityStrategy`]. Two implementations
//! cover the built-in kinds:
//!
//! - [`IdentityAddressed`]: rows are addressed by server id; a write with
//!   an id updates, a write without one creates.
//! - [`NaturalKeyUpsert`]: rows are addressed by a business key such as
//!   `(owner, date)`; every write is an insert-or-replace on that key.

use crate::error::{EngineError, EngineResult};
use dayline_core::{Cursor, OwnerId, Payload, ServerId};
use dayline_store::{rows, RowData, RowFilter, TableSpec, Tx};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// How a kind addresses its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Server id.
    Identity,
    /// Natural key.
    NaturalKey,
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePolicy::Identity => write!(f, "identity"),
            WritePolicy::NaturalKey => write!(f, "natural-key"),
        }
    }
}

/// What deleting an identity-addressed row does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Keep the row, flag it deleted and bump `updated_at`.
    #[default]
    Soft,
    /// Remove the row and its children.
    Hard,
}

/// Read and write operations for one kind.
pub trait EntityStrategy: Send + Sync {
    /// Type tag used by push items.
    fn tag(&self) -> &'static str;

    /// Bucket name used in snapshot and delta responses.
    fn bucket(&self) -> &'static str;

    /// Backing table.
    fn table(&self) -> &TableSpec;

    /// Addressing model.
    fn policy(&self) -> WritePolicy;

    /// Decodes and validates a push item's `data`.
    fn decode(&self, data: &Value) -> EngineResult<RowData>;

    /// Creates a row and returns its id.
    fn create(&self, tx: &Tx<'_>, owner: OwnerId, row: &RowData) -> EngineResult<ServerId>;

    /// Updates a row and returns the id to echo back.
    fn update(
        &self,
        tx: &Tx<'_>,
        owner: OwnerId,
        id: ServerId,
        row: &RowData,
    ) -> EngineResult<ServerId>;

    /// Deletes a row.
    fn delete(&self, tx: &Tx<'_>, owner: OwnerId, id: ServerId) -> EngineResult<()>;

    /// Applies a non-deleting push: update when an id is known, create otherwise.
    fn write(
        &self,
        tx: &Tx<'_>,
        owner: OwnerId,
        server_id: Option<ServerId>,
        row: &RowData,
    ) -> EngineResult<ServerId> {
        match server_id {
            Some(id) => self.update(tx, owner, id, row),
            None => self.create(tx, owner, row),
        }
    }

    /// Every row, tombstones included.
    fn list_all(&self, tx: &Tx<'_>, owner: OwnerId) -> EngineResult<Vec<Value>> {
        list(tx, self.table(), owner, &RowFilter::all())
    }

    /// Rows changed strictly after `since`, tombstones included.
    fn list_since(&self, tx: &Tx<'_>, owner: OwnerId, since: Cursor) -> EngineResult<Vec<Value>> {
        list(tx, self.table(), owner, &RowFilter::changed_since(since))
    }

    /// Live rows only.
    fn list_current(&self, tx: &Tx<'_>, owner: OwnerId) -> EngineResult<Vec<Value>> {
        list(tx, self.table(), owner, &RowFilter::current())
    }
}

fn list(
    tx: &Tx<'_>,
    table: &TableSpec,
    owner: OwnerId,
    filter: &RowFilter,
) -> EngineResult<Vec<Value>> {
    Ok(rows::select(tx, table, owner, filter)?
        .into_iter()
        .map(|row| row.into_record())
        .collect())
}

/// Decodes `data` into `P`, validates it and re-encodes it in canonical form.
fn decode_payload<P: Payload>(kind: &'static str, data: &Value) -> EngineResult<RowData> {
    let payload: P =
        serde_json::from_value(data.clone()).map_err(|e| EngineError::MalformedPayload {
            kind,
            message: e.to_string(),
        })?;
    payload
        .validate()
        .map_err(|source| EngineError::Validation { kind, source })?;

    let body = serde_json::to_value(&payload).map_err(|e| EngineError::MalformedPayload {
        kind,
        message: e.to_string(),
    })?;
    Ok(RowData::keyed(payload.natural_key(), body))
}

/// Kind addressed by server id.
pub struct IdentityAddressed<P> {
    tag: &'static str,
    bucket: &'static str,
    table: TableSpec,
    delete: DeletePolicy,
    payload: PhantomData<fn() -> P>,
}

impl<P: Payload> IdentityAddressed<P> {
    /// Creates a soft-deleting strategy.
    pub fn new(tag: &'static str, bucket: &'static str, table: TableSpec) -> Self {
        Self {
            tag,
            bucket,
            table,
            delete: DeletePolicy::Soft,
            payload: PhantomData,
        }
    }

    /// Sets the delete policy.
    pub fn with_delete_policy(mut self, delete: DeletePolicy) -> Self {
        self.delete = delete;
        self
    }

    /// Returns the delete policy.
    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete
    }
}

impl<P: Payload> EntityStrategy for IdentityAddressed<P> {
    fn tag(&self) -> &'static str {
        self.tag
    }

    fn bucket(&self) -> &'static str {
        self.bucket
    }

    fn table(&self) -> &TableSpec {
        &self.table
    }

    fn policy(&self) -> WritePolicy {
        WritePolicy::Identity
    }

    fn decode(&self, data: &Value) -> EngineResult<RowData> {
        decode_payload::<P>(self.tag, data)
    }

    fn create(&self, tx: &Tx<'_>, owner: OwnerId, row: &RowData) -> EngineResult<ServerId> {
        Ok(rows::insert(tx, &self.table, owner, row)?)
    }

    fn update(
        &self,
        tx: &Tx<'_>,
        owner: OwnerId,
        id: ServerId,
        row: &RowData,
    ) -> EngineResult<ServerId> {
        rows::update(tx, &self.table, owner, id, row)?;
        Ok(id)
    }

    fn delete(&self, tx: &Tx<'_>, owner: OwnerId, id: ServerId) -> EngineResult<()> {
        match self.delete {
            DeletePolicy::Soft => rows::tombstone(tx, &self.table, owner, id)?,
            // Already gone counts as deleted so replays stay idempotent.
            DeletePolicy::Hard => {
                rows::remove(tx, &self.table, owner, id)?;
            }
        }
        Ok(())
    }
}

/// Kind addressed by a natural key.
///
/// Supplied server ids are ignored on writes. Deletes are acknowledged
/// without touching the store: these kinds have no delete concept and
/// are cleared by upserting a new value for the same key.
pub struct NaturalKeyUpsert<P> {
    tag: &'static str,
    bucket: &'static str,
    table: TableSpec,
    payload: PhantomData<fn() -> P>,
}

impl<P: Payload> NaturalKeyUpsert<P> {
    /// Creates an upsert strategy.
    pub fn new(tag: &'static str, bucket: &'static str, table: TableSpec) -> Self {
        Self {
            tag,
            bucket,
            table,
            payload: PhantomData,
        }
    }
}

impl<P: Payload> EntityStrategy for NaturalKeyUpsert<P> {
    fn tag(&self) -> &'static str {
        self.tag
    }

    fn bucket(&self) -> &'static str {
        self.bucket
    }

    fn table(&self) -> &TableSpec {
        &self.table
    }

    fn policy(&self) -> WritePolicy {
        WritePolicy::NaturalKey
    }

    fn decode(&self, data: &Value) -> EngineResult<RowData> {
        decode_payload::<P>(self.tag, data)
    }

    fn create(&self, tx: &Tx<'_>, owner: OwnerId, row: &RowData) -> EngineResult<ServerId> {
        Ok(rows::upsert(tx, &self.table, owner, row)?)
    }

    fn update(
        &self,
        tx: &Tx<'_>,
        owner: OwnerId,
        _id: ServerId,
        row: &RowData,
    ) -> EngineResult<ServerId> {
        Ok(rows::upsert(tx, &self.table, owner, row)?)
    }

    fn delete(&self, _tx: &Tx<'_>, _owner: OwnerId, _id: ServerId) -> EngineResult<()> {
        Ok(())
    }

    fn write(
        &self,
        tx: &Tx<'_>,
        owner: OwnerId,
        _server_id: Option<ServerId>,
        row: &RowData,
    ) -> EngineResult<ServerId> {
        Ok(rows::upsert(tx, &self.table, owner, row)?)
    }
}
