//! Monotonic clock source for last-modified stamping
//!
//! Provides a wall-clock timestamp that never goes backward, so a
//! successful replace always yields a strictly larger last-modified
//! timestamp than the one it superseded.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// A clock source that guarantees monotonically increasing timestamps.
///
/// Optimistic concurrency compares last-modified stamps for equality, so
/// two replaces landing within the same wall-clock instant must still be
/// distinguishable.
#[derive(Debug)]
pub struct StampClock {
    /// High-water mark: the largest timestamp we've ever returned (nanos)
    high_water_ns: AtomicI64,
}

impl StampClock {
    pub fn new() -> Self {
        Self {
            high_water_ns: AtomicI64::new(0),
        }
    }

    /// Returns a monotonically increasing nanosecond timestamp.
    ///
    /// If the wall clock has gone backward (e.g. NTP adjustment),
    /// returns the previous high-water mark + 1ns instead.
    pub fn now_nanos(&self) -> i64 {
        let wall = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        loop {
            let prev = self.high_water_ns.load(Ordering::Acquire);
            let ts = wall.max(prev + 1);
            match self.high_water_ns.compare_exchange_weak(
                prev,
                ts,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return ts,
                Err(_) => continue, // CAS failed, retry
            }
        }
    }

    /// Returns `chrono::DateTime<Utc>` from the monotonic clock.
    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.now_nanos())
    }
}

impl Default for StampClock {
    fn default() -> Self {
        Self::new()
    }
}
