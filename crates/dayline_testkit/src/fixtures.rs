//! Test fixtures.
//!
//! Provides an engine over a fresh store driven by a manual clock, so
//! cursor comparisons in tests are deterministic.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dayline_core::{Cursor, ManualClock, OwnerId};
use dayline_store::{rows, RowFilter, Store, StoreResult};
use dayline_sync_engine::{Catalog, EngineOptions, SyncEngine};
use dayline_sync_protocol::{DeltaResponse, PushItem, PushRequest, PushResult, SnapshotResponse};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// The instant every harness clock starts at.
pub fn harness_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
        .single()
        .expect("valid start instant")
}

/// An engine, its store and clock, and one owner to act as.
pub struct TestHarness {
    /// The engine under test.
    pub engine: SyncEngine,
    /// Clock stamping every write and cursor.
    pub clock: Arc<ManualClock>,
    /// Default owner.
    pub owner: OwnerId,
    /// Keeps a file-backed store's directory alive.
    _temp_dir: Option<TempDir>,
}

impl TestHarness {
    /// Creates a harness over an in-memory store.
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Creates a harness over an in-memory store with custom options.
    pub fn with_options(options: EngineOptions) -> Self {
        let clock = Arc::new(ManualClock::starting_at(harness_epoch()));
        let store = Store::open_in_memory(clock.clone()).expect("Failed to open in-memory store");
        Self::assemble(store, clock, options, None)
    }

    /// Creates a harness over a store file in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = Arc::new(ManualClock::starting_at(harness_epoch()));
        let store = Store::open(temp_dir.path().join("dayline.db"), clock.clone())
            .expect("Failed to open file store");
        Self::assemble(store, clock, EngineOptions::default(), Some(temp_dir))
    }

    fn assemble(
        store: Store,
        clock: Arc<ManualClock>,
        options: EngineOptions,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let engine = SyncEngine::with_catalog(Arc::new(store), Catalog::standard(), options);
        Self {
            engine,
            clock,
            owner: OwnerId::new(),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the store file path if file-backed.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join("dayline.db"))
    }

    /// Returns the store.
    pub fn store(&self) -> &Store {
        self.engine.store()
    }

    /// Moves the clock forward.
    pub fn tick(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Pushes items as the default owner, bypassing batch validation.
    pub fn push(&self, items: Vec<PushItem>) -> Vec<PushResult> {
        self.engine.push_items(self.owner, &items)
    }

    /// Pushes one item as the default owner.
    pub fn push_one(&self, item: PushItem) -> PushResult {
        self.push(vec![item])
            .pop()
            .expect("one result per pushed item")
    }

    /// Pushes a validated request as the default owner.
    pub fn push_request(&self, items: Vec<PushItem>) -> Vec<PushResult> {
        self.engine
            .push(self.owner, &PushRequest::new(items))
            .expect("push request rejected")
            .results
    }

    /// Pushes a create and returns the assigned server id.
    pub fn create(&self, local_id: &str, kind: &str, data: Value) -> String {
        let result = self.push_one(PushItem::new(local_id, kind, data));
        assert!(result.success, "create failed: {:?}", result.error);
        result.server_id.expect("create returned no server id")
    }

    /// Reads a snapshot for the default owner.
    pub fn snapshot(&self) -> SnapshotResponse {
        self.engine.snapshot(self.owner).expect("snapshot failed")
    }

    /// Reads a delta for the default owner.
    pub fn delta(&self, since: Cursor) -> DeltaResponse {
        self.engine.delta(self.owner, since).expect("delta failed")
    }

    /// Reads live rows of a kind for the default owner.
    pub fn current(&self, tag: &str) -> Vec<Value> {
        self.engine.current(self.owner, tag).expect("current read failed")
    }

    /// Counts every stored row of a kind for the default owner, tombstones included.
    pub fn row_count(&self, tag: &str) -> usize {
        let kind = self.engine.catalog().get(tag).expect("unknown tag");
        let table = *kind.table();
        let owner = self.owner;
        self.store()
            .read(|tx| -> StoreResult<usize> {
                Ok(rows::select(tx, &table, owner, &RowFilter::all())?.len())
            })
            .expect("row count failed")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds a record by id in a bucket.
pub fn find_record<'a>(records: &'a [Value], id: &str) -> Option<&'a Value> {
    records.iter().find(|record| record["id"] == id)
}

/// Returns true if every field of `payload` appears in `record` with the same value.
pub fn record_matches(record: &Value, payload: &Value) -> bool {
    match payload.as_object() {
        Some(fields) => fields.iter().all(|(name, value)| &record[name] == value),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads;

    #[test]
    fn harness_round_trip() {
        let harness = TestHarness::new();
        let id = harness.create("l1", "habit", payloads::habit("Read"));

        let snapshot = harness.snapshot();
        let habits = snapshot.data.get("habits").unwrap();
        let record = find_record(habits, &id).unwrap();
        assert!(record_matches(record, &payloads::habit("Read")));
        assert_eq!(harness.row_count("habit"), 1);
    }

    #[test]
    fn file_harness_has_a_path() {
        let harness = TestHarness::file();
        assert!(harness.path().unwrap().exists());
        assert!(TestHarness::new().path().is_none());
    }
}
