//! # Dayline Store
//!
//! The relational store behind the sync engine, realised on SQLite.
//!
//! This crate provides:
//! - One table per synchronizable kind, described by a [`TableSpec`]
//! - Schema migrations
//! - A [`Store`] handle that runs closures inside read or write transactions
//! - Row operations: insert, update by id, tombstone, hard delete,
//!   natural-key upsert, and owner-scoped listing
//!
//! # Layout
//!
//! Every table carries the common columns `id`, `owner_id`, `body`,
//! `is_deleted`, `created_at`, `updated_at`. Natural-key tables add the
//! key columns of their [`KeyLayout`] and a unique index over
//! `(owner_id, key columns…)`. The kind-specific fields live in `body`
//! as the JSON payload the client pushed.
//!
//! Timestamps are stored as microseconds since the epoch and are always
//! taken from the store's [`Clock`](dayline_core::Clock).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod migrations;
pub mod rows;
mod schema;
mod store;

pub use error::{StoreError, StoreResult};
pub use migrations::{run_migrations, schema_version, CURRENT_VERSION};
pub use rows::{RowData, RowFilter, StoredRow};
pub use schema::{tables, KeyLayout, TableSpec};
pub use store::{Store, TableCounts, Tx};
