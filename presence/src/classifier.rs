//! The presence classifier state machine.

use proxima_types::{EngineParams, MotionSample, PresenceState, PresenceStatus};
use tracing::{debug, info, warn};

use crate::{ClassifierError, FeatureVector, FeatureWindow, GateStats, Hysteresis, PresenceModel};

/// Result of one classified window.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    /// Instantaneous label of this window (`true` = with user).
    pub label: bool,
    /// The variance gate decided this window without the model.
    pub gated: bool,
    pub ratio: f64,
    /// Smoothed state after pushing `label` into the hysteresis.
    pub smoothed: PresenceState,
    /// `smoothed` differs from the previous smoothed state.
    pub changed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WindowOutcome {
    Classified(Classification),
    /// The model failed on this window. No label was recorded.
    Failed(ClassifierError),
}

/// Sliding-window presence classifier.
///
/// Samples are ignored unless capture is running. Once the window is full it
/// is classified immediately and then every `hop_size` ingested samples.
pub struct PresenceClassifier<M> {
    model: M,
    window: FeatureWindow,
    hop_size: usize,
    ratio_threshold: f64,
    since_last: usize,
    classified_once: bool,
    hysteresis: Hysteresis,
    status: PresenceStatus,
    windows: u64,
}

impl<M: PresenceModel> PresenceClassifier<M> {
    pub fn new(model: M, params: &EngineParams) -> Self {
        Self {
            model,
            window: FeatureWindow::new(params.window_size),
            hop_size: params.hop_size,
            ratio_threshold: params.ratio_threshold,
            since_last: 0,
            classified_once: false,
            hysteresis: Hysteresis::new(),
            status: PresenceStatus::Idle,
            windows: 0,
        }
    }

    /// Begin a capture session with an empty window and fresh hysteresis.
    pub fn start(&mut self) {
        if matches!(self.status, PresenceStatus::Disabled(_)) {
            warn!("motion source unavailable; presence capture not started");
            return;
        }
        self.reset_window();
        self.status = PresenceStatus::Capturing;
        info!(model = self.model.name(), "presence capture started");
    }

    /// Stop capturing. Idempotent; a disabled classifier stays disabled.
    pub fn stop(&mut self) {
        self.reset_window();
        if !matches!(self.status, PresenceStatus::Disabled(_)) {
            self.status = PresenceStatus::Idle;
        }
    }

    /// The motion source cannot be started. Permanent for this classifier.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !matches!(self.status, PresenceStatus::Disabled(_)) {
            warn!(%reason, "motion source unavailable");
        }
        self.reset_window();
        self.status = PresenceStatus::Disabled(reason);
    }

    fn reset_window(&mut self) {
        self.window.clear();
        self.hysteresis.reset();
        self.since_last = 0;
        self.classified_once = false;
    }

    fn is_capturing(&self) -> bool {
        !matches!(self.status, PresenceStatus::Idle | PresenceStatus::Disabled(_))
    }

    /// Push one sample. Returns an outcome when this sample completes a hop.
    pub fn ingest(&mut self, sample: MotionSample) -> Option<WindowOutcome> {
        if !self.is_capturing() {
            return None;
        }
        self.window.push(sample);
        self.since_last += 1;
        if !self.window.is_full() {
            return None;
        }
        if self.classified_once && self.since_last < self.hop_size {
            return None;
        }
        self.since_last = 0;
        self.classified_once = true;
        Some(self.classify_window())
    }

    /// Classify the current window contents and update the smoothed state.
    pub fn classify_window(&mut self) -> WindowOutcome {
        self.windows += 1;
        let samples = self.window.as_slice();
        let gate = GateStats::compute(samples);

        let (label, gated) = if gate.is_stationary(self.ratio_threshold) {
            (false, true)
        } else {
            let features = FeatureVector::extract(samples);
            match self.model.predict(features.as_slice()) {
                Ok(label) => (label, false),
                Err(e) => {
                    warn!(error = %e, ratio = gate.ratio, "presence model failed");
                    self.status = PresenceStatus::Error(e.to_string());
                    return WindowOutcome::Failed(e);
                }
            }
        };

        let previous = self.hysteresis.state();
        let smoothed = self.hysteresis.push(label);
        let changed = smoothed != previous;
        self.status = PresenceStatus::Classified(smoothed);

        debug!(
            window = self.windows,
            label,
            gated,
            ratio = gate.ratio,
            smoothed = %smoothed,
            "window classified"
        );
        if changed {
            info!(state = %smoothed, "presence changed");
        }

        WindowOutcome::Classified(Classification {
            label,
            gated,
            ratio: gate.ratio,
            smoothed,
            changed,
        })
    }

    pub fn status(&self) -> &PresenceStatus {
        &self.status
    }

    /// Smoothed "with user" as seen by the proof gate.
    pub fn is_with_user(&self) -> bool {
        self.status.is_with_user()
    }

    pub fn windows_classified(&self) -> u64 {
        self.windows
    }
}
