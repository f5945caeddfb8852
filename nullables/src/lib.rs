//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the engine (wall clock, random source, radio,
//! presence model, proof service, attendance store) sits behind a trait.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what was asked of them
//! - Never touch the radio or the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod model;
pub mod proof;
pub mod radio;
pub mod random;
pub mod recorder;

pub use clock::NullClock;
pub use model::NullPresenceModel;
pub use proof::NullProofService;
pub use radio::{AdvertiserCall, NullAdvertiser};
pub use random::NullNonceSource;
pub use recorder::NullRecorder;
