//! Range monitor: in range while a matching beacon was seen recently.

use serde::{Deserialize, Serialize};

/// Default silence before reporting out of range (ms).
pub const DEFAULT_RANGE_TIMEOUT_MS: u64 = 35_000;
/// Default tick period (ms).
pub const DEFAULT_RANGE_TICK_MS: u64 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeState {
    InRange,
    OutOfRange,
}

impl RangeState {
    pub fn is_in_range(&self) -> bool {
        matches!(self, Self::InRange)
    }
}

pub struct RangeMonitor {
    timeout_ms: u64,
    tick_ms: u64,
    /// Start of monitoring; counts as an observation so a fresh session
    /// begins in range.
    baseline_ms: Option<u64>,
    next_tick_ms: Option<u64>,
    state: RangeState,
}

impl RangeMonitor {
    pub fn new(timeout_ms: u64, tick_ms: u64) -> Self {
        Self {
            timeout_ms,
            tick_ms,
            baseline_ms: None,
            next_tick_ms: None,
            state: RangeState::InRange,
        }
    }

    pub fn with_default() -> Self {
        Self::new(DEFAULT_RANGE_TIMEOUT_MS, DEFAULT_RANGE_TICK_MS)
    }

    pub fn start(&mut self, now_ms: u64) {
        self.baseline_ms = Some(now_ms);
        self.next_tick_ms = Some(now_ms + self.tick_ms);
        self.state = RangeState::InRange;
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&mut self) {
        self.baseline_ms = None;
        self.next_tick_ms = None;
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.next_tick_ms
    }

    /// Run the tick if it is due. Returns the new state if it changed.
    pub fn poll(&mut self, now_ms: u64, last_observation_ms: Option<u64>) -> Option<RangeState> {
        let deadline = self.next_tick_ms?;
        if now_ms < deadline {
            return None;
        }
        let mut next = deadline + self.tick_ms;
        while next <= now_ms {
            next += self.tick_ms;
        }
        self.next_tick_ms = Some(next);
        self.evaluate(now_ms, last_observation_ms)
    }

    /// Recompute the state from the elapsed time since the last observation.
    pub fn evaluate(&mut self, now_ms: u64, last_observation_ms: Option<u64>) -> Option<RangeState> {
        let reference = match (self.baseline_ms, last_observation_ms) {
            (Some(base), Some(seen)) => base.max(seen),
            (Some(base), None) => base,
            (None, Some(seen)) => seen,
            (None, None) => return None,
        };
        let elapsed = now_ms.saturating_sub(reference);
        let state = if elapsed > self.timeout_ms {
            RangeState::OutOfRange
        } else {
            RangeState::InRange
        };
        if state == self.state {
            return None;
        }
        tracing::info!(?state, elapsed_ms = elapsed, "range changed");
        self.state = state;
        Some(state)
    }

    pub fn state(&self) -> RangeState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_range_up_to_timeout() {
        let mut monitor = RangeMonitor::with_default();
        monitor.start(0);
        assert_eq!(monitor.evaluate(35_000, None), None);
        assert_eq!(monitor.state(), RangeState::InRange);
    }

    #[test]
    fn strictly_after_timeout_is_out_of_range() {
        let mut monitor = RangeMonitor::with_default();
        monitor.start(0);
        assert_eq!(monitor.evaluate(35_001, None), Some(RangeState::OutOfRange));
    }

    #[test]
    fn observation_brings_it_back() {
        let mut monitor = RangeMonitor::with_default();
        monitor.start(0);
        monitor.evaluate(40_000, None);
        assert_eq!(
            monitor.evaluate(41_000, Some(40_500)),
            Some(RangeState::InRange)
        );
    }

    #[test]
    fn poll_only_runs_on_tick() {
        let mut monitor = RangeMonitor::with_default();
        monitor.start(0);
        assert_eq!(monitor.next_deadline(), Some(1_000));
        assert_eq!(monitor.poll(999, None), None);
        assert_eq!(monitor.poll(36_500, None), Some(RangeState::OutOfRange));
        assert_eq!(monitor.next_deadline(), Some(37_000));
    }

    #[test]
    fn stopped_monitor_never_ticks() {
        let mut monitor = RangeMonitor::with_default();
        monitor.start(0);
        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.next_deadline(), None);
        assert_eq!(monitor.poll(100_000, None), None);
    }
}
