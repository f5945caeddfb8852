//! Wall-clock timestamps.
//!
//! Timestamps are Unix epoch seconds (UTC). They only label attendance
//! records; every scheduling decision inside the engine uses the
//! coordinator's monotonic millisecond clock instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the Unix epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of wall-clock time, swappable for a deterministic clock in tests.
pub trait WallClock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Reads the operating system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates() {
        let earlier = Timestamp::new(100);
        assert_eq!(earlier.elapsed_since(Timestamp::new(130)), 30);
        assert_eq!(Timestamp::new(200).elapsed_since(earlier), 0);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > Timestamp::EPOCH);
    }
}
