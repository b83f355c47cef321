//! Timestamp source.
//!
//! Tables store local wall-clock times as ISO-8601 strings without an
//! offset (`2025-06-01T10:00:00.123456`), so the clock hands out
//! `NaiveDateTime` values.

use std::sync::RwLock;

use chrono::{Duration, Local, NaiveDateTime};

/// Trait for providing the current date/time.
pub trait Clock {
    /// Get the current local date/time.
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that returns a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<NaiveDateTime>,
}

impl FixedClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap();
        *now += by;
    }

    /// Jump to a specific instant.
    pub fn set(&self, instant: NaiveDateTime) {
        *self.now.write().unwrap() = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.read().unwrap()
    }
}
