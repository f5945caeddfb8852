//! Engine parameters: every timing constant and threshold in one place.
//!
//! Durations are milliseconds on the coordinator's monotonic clock.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// All tunable parameters of the attendance engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // ── Beacon ───────────────────────────────────────────────────────────
    /// Interval between nonce rotations on the broadcaster.
    pub rotation_interval_ms: u64,

    /// Period of the range check on the scanner side.
    pub range_tick_ms: u64,

    /// Silence after which the scanner is considered out of range (strictly greater).
    pub range_timeout_ms: u64,

    // ── Presence ─────────────────────────────────────────────────────────
    /// Nominal motion sample rate in Hz.
    pub sample_rate_hz: u32,

    /// Samples per classification window (2 s at 50 Hz).
    pub window_size: usize,

    /// Samples between classifications (1 s at 50 Hz).
    pub hop_size: usize,

    /// Gyro-to-accel variance ratio below which a window is "not present"
    /// without consulting the learned model.
    pub ratio_threshold: f64,

    // ── Attendance ───────────────────────────────────────────────────────
    /// Delay from window start to the first presence sample.
    pub first_sample_delay_ms: u64,

    /// Interval between presence samples after the first one.
    pub sampling_interval_ms: u64,

    /// Length of an attendance window; the verdict fires once at its end.
    pub attendance_window_ms: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            rotation_interval_ms: 30_000,
            range_tick_ms: 1_000,
            range_timeout_ms: 35_000,
            sample_rate_hz: 50,
            window_size: 100,
            hop_size: 50,
            ratio_threshold: 5.0,
            first_sample_delay_ms: 5_000,
            sampling_interval_ms: 20_000,
            attendance_window_ms: 180_000,
        }
    }
}

impl EngineParams {
    /// Reject parameter sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), TypesError> {
        let positive = [
            ("rotation_interval_ms", self.rotation_interval_ms),
            ("range_tick_ms", self.range_tick_ms),
            ("sampling_interval_ms", self.sampling_interval_ms),
            ("attendance_window_ms", self.attendance_window_ms),
            ("sample_rate_hz", u64::from(self.sample_rate_hz)),
            ("window_size", self.window_size as u64),
            ("hop_size", self.hop_size as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(TypesError::InvalidParams(format!("{name} must be > 0")));
            }
        }
        // A zero threshold would let zero-gyro windows through the gate.
        if !self.ratio_threshold.is_finite() || self.ratio_threshold <= 0.0 {
            return Err(TypesError::InvalidParams(format!(
                "ratio_threshold must be a finite positive number, got {}",
                self.ratio_threshold
            )));
        }
        Ok(())
    }

    /// Nominal spacing between motion samples in milliseconds.
    pub fn sample_period_ms(&self) -> u64 {
        1_000 / u64::from(self.sample_rate_hz.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = EngineParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.sample_period_ms(), 20);
        assert_eq!(params.window_size, 2 * params.sample_rate_hz as usize);
    }

    #[test]
    fn zero_hop_is_rejected() {
        let params = EngineParams {
            hop_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(TypesError::InvalidParams(_))
        ));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let params = EngineParams {
            ratio_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let params = EngineParams {
            ratio_threshold: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(TypesError::InvalidParams(_))
        ));
    }
}
