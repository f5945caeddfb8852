//! Boundary to the radio stack on the broadcasting side.

use crate::{AdvertisementPayload, BeaconError};

/// Power/authorization state reported by the radio stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioState {
    PoweredOn,
    PoweredOff,
    Unauthorized,
    Unsupported,
    Unknown,
}

impl RadioState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::PoweredOn)
    }
}

/// A radio that can advertise one payload at a time.
///
/// Calls are commands to the stack and must not block. The emitter always
/// calls [`Advertiser::stop_advertising`] before starting a new payload, so
/// an implementation never sees two payloads active at once.
pub trait Advertiser: Send {
    fn state(&self) -> RadioState;

    fn start_advertising(&mut self, payload: &AdvertisementPayload) -> Result<(), BeaconError>;

    /// Stop the current advertisement. Must be a no-op when nothing is advertised.
    fn stop_advertising(&mut self);
}
