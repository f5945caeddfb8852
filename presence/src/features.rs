//! Window statistics: the variance gate and the 14-scalar feature vector.
//!
//! All variances are population variances (divide by N), matching the
//! features the presence model was trained on.

use proxima_types::MotionSample;
use serde::{Deserialize, Serialize};

/// Length of the feature vector fed to the presence model.
pub const FEATURE_COUNT: usize = 14;

/// Feature names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "ax_mean", "ax_var", "ay_mean", "ay_var", "az_mean", "az_var", "gx_mean", "gx_var",
    "gy_mean", "gy_var", "gz_mean", "gz_var", "mag_mean", "mag_var",
];

/// Floor applied to the accel variance before dividing.
pub const MIN_ACCEL_VARIANCE: f64 = 1e-12;

/// Mean and population variance of a series. Empty input yields `(0, 0)`.
pub fn mean_and_variance<I>(values: I) -> (f64, f64)
where
    I: Iterator<Item = f64> + Clone,
{
    let (sum, count) = values.clone().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return (0.0, 0.0);
    }
    let n = count as f64;
    let mean = sum / n;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var)
}

/// Inputs to the numeric gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateStats {
    pub accel_var_mean: f64,
    pub gyro_var_mean: f64,
    /// `gyro_var_mean / max(accel_var_mean, 1e-12)`.
    pub ratio: f64,
}

impl GateStats {
    pub fn compute(samples: &[MotionSample]) -> Self {
        let mut accel_vars = [0.0; 3];
        let mut gyro_vars = [0.0; 3];
        for axis in 0..3 {
            accel_vars[axis] = mean_and_variance(samples.iter().map(|s| s.accel[axis])).1;
            gyro_vars[axis] = mean_and_variance(samples.iter().map(|s| s.gyro[axis])).1;
        }
        let accel_var_mean = accel_vars.iter().sum::<f64>() / 3.0;
        let gyro_var_mean = gyro_vars.iter().sum::<f64>() / 3.0;
        Self {
            accel_var_mean,
            gyro_var_mean,
            ratio: gyro_var_mean / accel_var_mean.max(MIN_ACCEL_VARIANCE),
        }
    }

    /// True when the window is too still to be carried by a person.
    ///
    /// A NaN ratio does not pass the gate here; it reaches the model, which
    /// rejects non-finite input.
    pub fn is_stationary(&self, threshold: f64) -> bool {
        self.ratio < threshold
    }
}

/// `(mean, var)` for each of the 6 channels, then for the accel magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn extract(samples: &[MotionSample]) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        for channel in 0..6 {
            let (mean, var) = mean_and_variance(samples.iter().map(|s| s.channel(channel)));
            values[channel * 2] = mean;
            values[channel * 2 + 1] = var;
        }
        let (mag_mean, mag_var) = mean_and_variance(samples.iter().map(|s| s.accel_magnitude()));
        values[12] = mag_mean;
        values[13] = mag_var;
        Self(values)
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Look up a feature by its column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}
