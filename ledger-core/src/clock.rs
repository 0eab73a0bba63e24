//! Creation timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::Timestamp;

/// Hands out creation timestamps that never go backwards.
///
/// Timestamps have microsecond precision, matching Postgres `timestamptz`,
/// so a ledger read back from the store compares equal to the one returned
/// by `create`. If the wall clock steps back, the last issued value is
/// repeated until the wall clock catches up.
#[derive(Debug, Default)]
pub struct CreationClock {
    last_micros: AtomicI64,
}

impl CreationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a floor: no timestamp earlier than `floor` is issued.
    pub fn starting_at(floor: Timestamp) -> Self {
        Self {
            last_micros: AtomicI64::new(floor.timestamp_micros()),
        }
    }

    pub fn now(&self) -> Timestamp {
        let wall = Utc::now().timestamp_micros();
        let previous = self.last_micros.fetch_max(wall, Ordering::AcqRel);
        let issued = previous.max(wall);
        DateTime::from_timestamp_micros(issued).unwrap_or_else(Utc::now)
    }
}
