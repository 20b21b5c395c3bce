//! # Dayline Testkit
//!
//! Test utilities for dayline.
//!
//! This crate provides:
//! - [`TestHarness`]: an engine over a fresh store, a manual clock and
//!   one owner
//! - Payload builders for every built-in kind
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dayline_testkit::prelude::*;
//!
//! #[test]
//! fn mood_round_trip() {
//!     let harness = TestHarness::new();
//!     let result = harness.push_one(PushItem::new("l1", "mood", payloads::mood(4, &day(1))));
//!     assert!(result.success);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod payloads;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::payloads;
    pub use crate::payloads::day;
    pub use dayline_sync_protocol::{PushItem, PushRequest, PushResult};
}

pub use fixtures::*;
pub use generators::*;
