//! The attendance sampler: periodic presence samples and one verdict per window.
//!
//! Timeline relative to `start(t0)`:
//! - first sample at `t0 + first_sample_delay_ms` (5 s);
//! - further samples every `sampling_interval_ms` (20 s);
//! - the verdict at `t0 + attendance_window_ms` (180 s), which closes the
//!   window and cancels the sampling timer.

use std::sync::Arc;

use proxima_types::{AttendanceStatus, AttendanceVerdict, EngineParams, WallClock};
use tracing::{debug, info};

use crate::Tally;

/// One sampling interval's majority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceSample {
    /// 0-based position in the window.
    pub index: usize,
    pub present: bool,
    pub bucket: Tally,
    pub at_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SamplerEvent {
    Sampled(PresenceSample),
    Verdict(AttendanceVerdict),
}

pub struct AttendanceSampler {
    first_sample_delay_ms: u64,
    sampling_interval_ms: u64,
    window_ms: u64,
    clock: Arc<dyn WallClock>,
    bucket: Tally,
    samples: Vec<bool>,
    started_at_ms: Option<u64>,
    next_sample_ms: Option<u64>,
    verdict_at_ms: Option<u64>,
}

impl AttendanceSampler {
    pub fn new(params: &EngineParams, clock: Arc<dyn WallClock>) -> Self {
        Self {
            first_sample_delay_ms: params.first_sample_delay_ms,
            sampling_interval_ms: params.sampling_interval_ms,
            window_ms: params.attendance_window_ms,
            clock,
            bucket: Tally::default(),
            samples: Vec::new(),
            started_at_ms: None,
            next_sample_ms: None,
            verdict_at_ms: None,
        }
    }

    /// Open a fresh window. A pending window is discarded first, without a
    /// verdict, so windows never overlap.
    pub fn start(&mut self, now_ms: u64) {
        if self.stop() {
            info!("attendance window restarted before its verdict");
        }
        self.started_at_ms = Some(now_ms);
        self.next_sample_ms = Some(now_ms + self.first_sample_delay_ms);
        self.verdict_at_ms = Some(now_ms + self.window_ms);
        info!(
            window_ms = self.window_ms,
            first_sample_ms = self.first_sample_delay_ms,
            "attendance window opened"
        );
    }

    /// Cancel all timers and drop accumulated labels and samples. Returns
    /// `true` if a window was pending. Idempotent.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.bucket.clear();
        self.samples.clear();
        self.started_at_ms = None;
        self.next_sample_ms = None;
        self.verdict_at_ms = None;
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.verdict_at_ms.is_some()
    }

    /// Add an instantaneous presence label to the current bucket. Labels
    /// arriving outside a window are ignored.
    pub fn record_label(&mut self, with_user: bool) -> bool {
        if !self.is_running() {
            return false;
        }
        self.bucket.record(with_user);
        true
    }

    /// Close the current bucket: append its strict majority as a sample and
    /// clear it.
    pub fn sample_once(&mut self, now_ms: u64) -> PresenceSample {
        let bucket = self.bucket;
        let present = bucket.majority();
        self.samples.push(present);
        self.bucket.clear();
        let sample = PresenceSample {
            index: self.samples.len() - 1,
            present,
            bucket,
            at_ms: now_ms,
        };
        debug!(
            index = sample.index,
            present,
            positive = bucket.positive,
            negative = bucket.negative,
            "presence sample taken"
        );
        sample
    }

    pub fn next_deadline(&self) -> Option<u64> {
        match (self.next_sample_ms, self.verdict_at_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire everything due at `now_ms`, oldest first. After the verdict
    /// nothing else fires until the next `start`.
    pub fn poll(&mut self, now_ms: u64) -> Vec<SamplerEvent> {
        let mut events = Vec::new();
        while let Some(verdict_at) = self.verdict_at_ms {
            match self.next_sample_ms {
                Some(sample_at) if sample_at <= now_ms && sample_at <= verdict_at => {
                    events.push(SamplerEvent::Sampled(self.sample_once(sample_at)));
                    self.next_sample_ms = Some(sample_at + self.sampling_interval_ms);
                }
                _ if verdict_at <= now_ms => {
                    events.push(SamplerEvent::Verdict(self.finish()));
                }
                _ => break,
            }
        }
        events
    }

    fn finish(&mut self) -> AttendanceVerdict {
        let tally = Tally::of(&self.samples);
        let verdict = AttendanceVerdict {
            status: AttendanceStatus::from_present(tally.majority()),
            present_samples: tally.positive,
            absent_samples: tally.negative,
            decided_at: self.clock.now(),
        };
        info!(
            status = %verdict.status,
            present = tally.positive,
            absent = tally.negative,
            "attendance verdict"
        );
        self.stop();
        verdict
    }

    pub fn samples(&self) -> &[bool] {
        &self.samples
    }

    pub fn bucket(&self) -> Tally {
        self.bucket
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }
}
