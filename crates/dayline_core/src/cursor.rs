//! Sync cursor and the clock that stamps writes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Boundary between "already synced" and "not yet synced" data.
///
/// A cursor is a wall-clock instant at microsecond resolution. Clients
/// pass it back verbatim as `since`; a delta read returns rows stamped
/// strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(DateTime<Utc>);

impl Cursor {
    /// The Unix epoch. A delta from here returns everything.
    pub const EPOCH: Cursor = Cursor(DateTime::<Utc>::UNIX_EPOCH);

    /// Wraps an instant.
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Creates a cursor from microseconds since the epoch.
    ///
    /// Out-of-range values clamp to the epoch.
    #[must_use]
    pub fn from_micros(micros: i64) -> Self {
        Self(DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }

    /// Returns microseconds since the epoch.
    #[must_use]
    pub fn as_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// Returns the instant.
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
    }
}

impl From<DateTime<Utc>> for Cursor {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

/// Source of write and cursor timestamps.
///
/// The store stamps `created_at`/`updated_at` and captures cursors with
/// the same clock, so both sides of a delta comparison share one timeline.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock that never repeats or goes backwards.
///
/// Every call returns an instant at least one microsecond after the
/// previous one, even if the system clock stalls or steps back.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_micros: AtomicI64,
}

impl SystemClock {
    /// Creates a new system clock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut issued = wall;
        // fetch_update only fails if the closure returns None, which it never does.
        let _ = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = wall.max(last + 1);
                Some(issued)
            });
        DateTime::from_timestamp_micros(issued).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Deterministic clock for tests and tooling.
///
/// Each call returns the current instant and then advances by `step`.
#[derive(Debug)]
pub struct ManualClock {
    current_micros: AtomicI64,
    step_micros: i64,
}

impl ManualClock {
    /// Creates a clock starting at `start`, ticking one millisecond per call.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self::with_step(start, Duration::milliseconds(1))
    }

    /// Creates a clock with a custom step.
    pub fn with_step(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current_micros: AtomicI64::new(start.timestamp_micros()),
            step_micros: step.num_microseconds().unwrap_or(1).max(0),
        }
    }

    /// Returns the instant the next call to `now` will produce.
    pub fn peek(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.current_micros.load(Ordering::SeqCst))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.current_micros
            .fetch_add(by.num_microseconds().unwrap_or(0), Ordering::SeqCst);
    }

    /// Jumps the clock to an instant.
    pub fn set(&self, at: DateTime<Utc>) {
        self.current_micros
            .store(at.timestamp_micros(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let micros = self
            .current_micros
            .fetch_add(self.step_micros, Ordering::SeqCst);
        DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
