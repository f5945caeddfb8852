//! Inertial samples pushed by the motion source.

use serde::{Deserialize, Serialize};

/// Number of scalar channels in a sample (3 acceleration + 3 angular rate).
pub const MOTION_CHANNELS: usize = 6;

/// One inertial reading: user acceleration (g), rotation rate (rad/s), capture time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub accel: [f64; 3],
    pub gyro: [f64; 3],
    /// Capture time in milliseconds on the motion source's clock.
    pub captured_at_ms: u64,
}

impl MotionSample {
    pub fn new(accel: [f64; 3], gyro: [f64; 3], captured_at_ms: u64) -> Self {
        Self {
            accel,
            gyro,
            captured_at_ms,
        }
    }

    /// Channel `i` in the order `ax, ay, az, gx, gy, gz`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= MOTION_CHANNELS`.
    pub fn channel(&self, i: usize) -> f64 {
        if i < 3 {
            self.accel[i]
        } else {
            self.gyro[i - 3]
        }
    }

    /// Euclidean norm of the acceleration vector.
    pub fn accel_magnitude(&self) -> f64 {
        let [x, y, z] = self.accel;
        (x * x + y * y + z * z).sqrt()
    }
}
