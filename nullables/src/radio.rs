//! Nullable radio: records advertising commands instead of transmitting.

use std::sync::{Arc, Mutex, MutexGuard};

use proxima_beacon::{AdvertisementPayload, Advertiser, BeaconError, RadioState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvertiserCall {
    Start(AdvertisementPayload),
    Stop,
}

#[derive(Debug)]
struct Inner {
    state: RadioState,
    calls: Vec<AdvertiserCall>,
    active: Option<AdvertisementPayload>,
    fail_start: bool,
}

/// A test radio. Clones share the same log, so a test can keep one handle
/// while the emitter owns another.
#[derive(Clone, Debug)]
pub struct NullAdvertiser {
    inner: Arc<Mutex<Inner>>,
}

impl NullAdvertiser {
    pub fn new() -> Self {
        Self::with_state(RadioState::PoweredOn)
    }

    pub fn with_state(state: RadioState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                calls: Vec::new(),
                active: None,
                fail_start: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic in another test thread must not hide this log.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_state(&self, state: RadioState) {
        self.lock().state = state;
    }

    /// Make every following `start_advertising` fail.
    pub fn fail_next_starts(&self) {
        self.lock().fail_start = true;
    }

    /// Every start/stop command, in order.
    pub fn calls(&self) -> Vec<AdvertiserCall> {
        self.lock().calls.clone()
    }

    /// The payload currently on air.
    pub fn active(&self) -> Option<AdvertisementPayload> {
        self.lock().active.clone()
    }

    /// Payloads started so far.
    pub fn started(&self) -> Vec<AdvertisementPayload> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                AdvertiserCall::Start(p) => Some(p.clone()),
                AdvertiserCall::Stop => None,
            })
            .collect()
    }
}

impl Default for NullAdvertiser {
    fn default() -> Self {
        Self::new()
    }
}

impl Advertiser for NullAdvertiser {
    fn state(&self) -> RadioState {
        self.lock().state
    }

    fn start_advertising(&mut self, payload: &AdvertisementPayload) -> Result<(), BeaconError> {
        let mut inner = self.lock();
        if inner.fail_start {
            return Err(BeaconError::Advertise("null radio refused".into()));
        }
        if inner.active.is_some() {
            return Err(BeaconError::Advertise("already advertising".into()));
        }
        inner.calls.push(AdvertiserCall::Start(payload.clone()));
        inner.active = Some(payload.clone());
        Ok(())
    }

    fn stop_advertising(&mut self) {
        let mut inner = self.lock();
        inner.calls.push(AdvertiserCall::Stop);
        inner.active = None;
    }
}
