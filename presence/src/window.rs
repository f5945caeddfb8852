//! Sliding window over the most recent motion samples.

use proxima_types::MotionSample;
use std::collections::VecDeque;

/// Default window length: 2 s at 50 Hz.
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Fixed-capacity ring of the most recent samples. Older samples are
/// overwritten in place once the window is full.
pub struct FeatureWindow {
    capacity: usize,
    samples: VecDeque<MotionSample>,
}

impl FeatureWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn with_default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }

    /// Append a sample, evicting the oldest when at capacity.
    pub fn push(&mut self, sample: MotionSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest-first view of the window as one slice.
    pub fn as_slice(&mut self) -> &[MotionSample] {
        self.samples.make_contiguous()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
