//! Snapshot and delta readers.

use crate::catalog::Catalog;
use crate::config::EngineOptions;
use crate::error::EngineResult;
use crate::strategy::EntityStrategy;
use dayline_core::{Cursor, OwnerId};
use dayline_store::{Store, Tx};
use dayline_sync_protocol::{DeltaResponse, SnapshotResponse, SyncData, SyncResponse};
use serde_json::Value;
use tracing::{error, info, warn};

/// Reads every record of every kind for an owner.
pub struct SnapshotReader<'a> {
    store: &'a Store,
    catalog: &'a Catalog,
    options: &'a EngineOptions,
}

impl<'a> SnapshotReader<'a> {
    /// Creates a reader.
    pub fn new(store: &'a Store, catalog: &'a Catalog, options: &'a EngineOptions) -> Self {
        Self {
            store,
            catalog,
            options,
        }
    }

    /// Returns one bucket per kind, tombstones included, and a fresh cursor.
    ///
    /// Every bucket is present, even when empty.
    pub fn read(&self, owner: OwnerId) -> EngineResult<SnapshotResponse> {
        let response = read_buckets(self.store, self.catalog, self.options, true, |kind, tx| {
            kind.list_all(tx, owner)
        })?;
        info!(
            %owner,
            records = response.data.record_count(),
            cursor = %response.last_sync_timestamp,
            "Snapshot read"
        );
        Ok(response)
    }
}

/// Reads records changed since a cursor.
pub struct DeltaReader<'a> {
    store: &'a Store,
    catalog: &'a Catalog,
    options: &'a EngineOptions,
}

impl<'a> DeltaReader<'a> {
    /// Creates a reader.
    pub fn new(store: &'a Store, catalog: &'a Catalog, options: &'a EngineOptions) -> Self {
        Self {
            store,
            catalog,
            options,
        }
    }

    /// Returns the rows whose `updated_at` is strictly after `since`.
    ///
    /// Kinds with no such rows are left out of `data`.
    pub fn read(&self, owner: OwnerId, since: Cursor) -> EngineResult<DeltaResponse> {
        let response = read_buckets(self.store, self.catalog, self.options, false, |kind, tx| {
            kind.list_since(tx, owner, since)
        })?;
        info!(
            %owner,
            %since,
            buckets = response.data.len(),
            records = response.data.record_count(),
            cursor = %response.last_sync_timestamp,
            "Delta read"
        );
        Ok(response)
    }
}

/// Reads all buckets in one transaction.
///
/// The cursor is captured inside the same transaction that reads the
/// rows, so no write can land between the two.
fn read_buckets<F>(
    store: &Store,
    catalog: &Catalog,
    options: &EngineOptions,
    keep_empty: bool,
    list: F,
) -> EngineResult<SyncResponse>
where
    F: Fn(&dyn EntityStrategy, &Tx<'_>) -> EngineResult<Vec<Value>>,
{
    store.read(|tx| {
        let cursor = tx.cursor();
        let mut data = SyncData::new();
        let mut failed = Vec::new();

        for kind in catalog.iter() {
            match list(kind, tx) {
                Ok(records) => {
                    if keep_empty || !records.is_empty() {
                        data.insert(kind.bucket(), records);
                    }
                }
                Err(err) if options.tolerate_bucket_failures => {
                    warn!(bucket = kind.bucket(), error = %err, "Skipping unreadable bucket");
                    failed.push(kind.bucket().to_string());
                }
                Err(err) => {
                    error!(bucket = kind.bucket(), error = %err, "Bucket read failed");
                    return Err(err);
                }
            }
        }

        Ok(SyncResponse::success(data, cursor).with_failed_kinds(failed))
    })
}
