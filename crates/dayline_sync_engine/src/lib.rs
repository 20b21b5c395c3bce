//! # Dayline Sync Engine
//!
//! Full-state export, incremental export and batched push reconciliation
//! for offline-first dayline clients.
//!
//! This crate provides:
//! - The entity [`Catalog`], a registry of [`EntityStrategy`] objects keyed
//!   by type tag
//! - Two write policies: [`IdentityAddressed`] and [`NaturalKeyUpsert`]
//! - [`SnapshotReader`] and [`DeltaReader`]
//! - [`PushReconciler`]
//! - [`SyncEngine`], tying the above to a [`Store`]
//!
//! ## Sync model
//!
//! A client reads one snapshot on first install, then alternates pushes
//! of its local edits with delta reads from the last cursor it received.
//!
//! ## Key Invariants
//!
//! - No record is read or written across owners
//! - A push never fails as a whole because of one item
//! - Replaying a push with the returned server id never adds a row
//! - At most one live row exists per natural key
//! - Deleted identity-addressed rows stay visible to sync as tombstones
//! - A delta from a returned cursor sees every write committed after it

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod catalog;
mod config;
mod error;
pub mod kinds;
mod reader;
mod reconciler;
mod strategy;

pub use catalog::Catalog;
pub use config::{EngineOptions, DEFAULT_MAX_PUSH_BATCH};
pub use error::{EngineError, EngineResult};
pub use reader::{DeltaReader, SnapshotReader};
pub use reconciler::PushReconciler;
pub use strategy::{DeletePolicy, EntityStrategy, IdentityAddressed, NaturalKeyUpsert, WritePolicy};

use dayline_core::{Cursor, OwnerId};
use dayline_store::Store;
use dayline_sync_protocol::{
    DeltaResponse, PushItem, PushRequest, PushResponse, PushResult, SnapshotResponse,
    StatusResponse,
};
use serde_json::Value;
use std::sync::Arc;

/// The sync engine.
///
/// Stateless between calls; every call reads or writes the shared store
/// and may run concurrently with any other.
pub struct SyncEngine {
    store: Arc<Store>,
    catalog: Catalog,
    options: EngineOptions,
}

impl SyncEngine {
    /// Creates an engine over the built-in kinds with default options.
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_catalog(store, Catalog::standard(), EngineOptions::default())
    }

    /// Creates an engine with a custom catalog and options.
    pub fn with_catalog(store: Arc<Store>, catalog: Catalog, options: EngineOptions) -> Self {
        Self {
            store,
            catalog,
            options,
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Reads the owner's complete state.
    pub fn snapshot(&self, owner: OwnerId) -> EngineResult<SnapshotResponse> {
        SnapshotReader::new(&self.store, &self.catalog, &self.options).read(owner)
    }

    /// Reads the owner's changes strictly after `since`.
    pub fn delta(&self, owner: OwnerId, since: Cursor) -> EngineResult<DeltaResponse> {
        DeltaReader::new(&self.store, &self.catalog, &self.options).read(owner, since)
    }

    /// Validates and applies a push request.
    ///
    /// Fails as a whole only for batch-level problems (empty or oversized
    /// batch); item failures are reported per result.
    pub fn push(&self, owner: OwnerId, request: &PushRequest) -> EngineResult<PushResponse> {
        request.validate(self.options.max_push_batch)?;
        Ok(PushResponse::success(self.push_items(owner, &request.items)))
    }

    /// Applies items without batch-level validation.
    pub fn push_items(&self, owner: OwnerId, items: &[PushItem]) -> Vec<PushResult> {
        PushReconciler::new(&self.store, &self.catalog).push(owner, items)
    }

    /// Reads the live rows of one kind, tombstones excluded.
    pub fn current(&self, owner: OwnerId, tag: &str) -> EngineResult<Vec<Value>> {
        let kind = self.catalog.require(tag)?;
        self.store.read(|tx| kind.list_current(tx, owner))
    }

    /// Reports the server clock and the caller's identity.
    pub fn status(&self, owner: OwnerId) -> StatusResponse {
        StatusResponse::new(self.store.clock().now(), owner.to_string())
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("catalog", &self.catalog)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
