//! Fundamental types for the proxima attendance engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! nonces, advertised identifiers, motion samples, presence and attendance states,
//! timestamps, and the engine's timing parameters.

pub mod error;
pub mod identifier;
pub mod motion;
pub mod nonce;
pub mod params;
pub mod presence;
pub mod time;

pub use error::TypesError;
pub use identifier::{AdvertisedIdentifier, BEACON_MARKER, BEACON_PREFIX};
pub use motion::MotionSample;
pub use nonce::{Nonce, NONCE_LEN};
pub use params::EngineParams;
pub use presence::{AttendanceStatus, AttendanceVerdict, PresenceState, PresenceStatus};
pub use time::{SystemClock, Timestamp, WallClock};
