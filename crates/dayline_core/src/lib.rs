//! # Dayline Core
//!
//! Shared domain types for the dayline sync engine.
//!
//! This crate provides:
//! - Identifiers for owners and server-side records
//! - The sync [`Cursor`] and the [`Clock`] that stamps writes
//! - Typed payload shapes for every synchronizable kind
//! - Payload validation
//!
//! It performs no I/O. Storage lives in `dayline_store`, the sync
//! handshake in `dayline_sync_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod cursor;
pub mod date;
mod error;
mod id;
pub mod payload;

pub use cursor::{Clock, Cursor, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use id::{OwnerId, ServerId};
pub use payload::{NaturalKey, Payload};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
