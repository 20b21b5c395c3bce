//! # Dayline Sync Protocol
//!
//! Wire messages for the dayline sync endpoints.
//!
//! This crate provides:
//! - Snapshot and delta responses carrying per-kind record buckets
//! - Push requests, push items and per-item push results
//! - The status response and the error envelope
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Field naming
//!
//! Envelope and push fields are camelCase (`localId`, `lastSyncTimestamp`).
//! Push items also accept the snake_case spelling (`local_id`) older
//! clients send. Record objects inside buckets keep the snake_case field
//! names of the stored rows.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    decode, encode, DeltaRequest, DeltaResponse, ErrorResponse, PushItem, PushRequest,
    PushResponse, PushResult, SnapshotResponse, Status, StatusResponse, SyncData, SyncResponse,
};
