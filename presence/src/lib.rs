//! Presence classification from inertial data.
//!
//! Pipeline per hop (1 s at 50 Hz), once the 2 s window is full:
//! 1. per-axis population variance → gyro/accel variance ratio;
//! 2. ratio below threshold → "not present" without consulting the model;
//! 3. otherwise a 14-scalar feature vector goes to a [`PresenceModel`];
//! 4. the raw label passes through a two-slot [`Hysteresis`] that only flips
//!    to "left behind" after two consecutive negative windows.
//!
//! [`dataset`] reuses the same feature extraction offline, for labelled logs.

pub mod classifier;
pub mod dataset;
pub mod error;
pub mod features;
pub mod forest;
pub mod hysteresis;
pub mod model;
pub mod window;

pub use classifier::{Classification, PresenceClassifier, WindowOutcome};
pub use dataset::{DatasetLabel, LabeledSample};
pub use error::{ClassifierError, PresenceError};
pub use features::{FeatureVector, GateStats, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::ForestModel;
pub use hysteresis::Hysteresis;
pub use model::{GateOnlyModel, PresenceModel};
pub use window::FeatureWindow;
