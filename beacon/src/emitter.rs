//! Beacon broadcaster: rotates the nonce and re-advertises `prefix ‖ nonce`.

use proxima_types::{AdvertisedIdentifier, Nonce, BEACON_MARKER, BEACON_PREFIX};

use crate::{AdvertisementPayload, Advertiser, BeaconError, NonceSource};

/// Default rotation interval (ms).
pub const DEFAULT_ROTATION_INTERVAL_MS: u64 = 30_000;

pub struct NonceBroadcastEmitter<A, R> {
    advertiser: A,
    source: R,
    prefix: [u8; 8],
    marker: String,
    rotation_interval_ms: u64,
    /// Payload currently on air.
    current: Option<AdvertisementPayload>,
    /// Deadline of the next rotation while running.
    next_rotation_ms: Option<u64>,
    rotations: u64,
}

impl<A: Advertiser, R: NonceSource> NonceBroadcastEmitter<A, R> {
    pub fn new(advertiser: A, source: R, rotation_interval_ms: u64) -> Self {
        Self {
            advertiser,
            source,
            prefix: BEACON_PREFIX,
            marker: BEACON_MARKER.to_string(),
            rotation_interval_ms,
            current: None,
            next_rotation_ms: None,
            rotations: 0,
        }
    }

    pub fn with_default(advertiser: A, source: R) -> Self {
        Self::new(advertiser, source, DEFAULT_ROTATION_INTERVAL_MS)
    }

    /// Override the fixed identity (prefix and marker text).
    pub fn with_identity(mut self, prefix: [u8; 8], marker: impl Into<String>) -> Self {
        self.prefix = prefix;
        self.marker = marker.into();
        self
    }

    /// Rotate once immediately, then every rotation interval via [`poll`](Self::poll).
    ///
    /// Fails with [`BeaconError::RadioUnavailable`] if the radio is not powered on.
    pub fn start(&mut self, now_ms: u64) -> Result<Nonce, BeaconError> {
        let state = self.advertiser.state();
        if !state.is_ready() {
            return Err(BeaconError::RadioUnavailable(format!("{state:?}")));
        }
        let nonce = self.rotate()?;
        self.next_rotation_ms = Some(now_ms + self.rotation_interval_ms);
        Ok(nonce)
    }

    /// Generate a fresh nonce and restart advertising with it.
    ///
    /// The previous advertisement is stopped before the new one starts, so two
    /// identifiers are never on air together.
    pub fn rotate(&mut self) -> Result<Nonce, BeaconError> {
        let nonce = self.source.next_nonce()?;
        let payload = AdvertisementPayload {
            local_name: self.marker.clone(),
            identifier: AdvertisedIdentifier::compose(self.prefix, &nonce),
        };

        if self.current.take().is_some() {
            self.advertiser.stop_advertising();
        }
        self.advertiser.start_advertising(&payload)?;

        tracing::info!(
            nonce = %nonce,
            service_uuid = %payload.service_uuid(),
            "advertising nonce"
        );
        self.current = Some(payload);
        self.rotations += 1;
        Ok(nonce)
    }

    /// Deadline of the next scheduled rotation, if running.
    pub fn next_deadline(&self) -> Option<u64> {
        self.next_rotation_ms
    }

    /// Rotate if the deadline has passed. A late poll rotates once and
    /// schedules the next deadline on the unchanged cadence.
    pub fn poll(&mut self, now_ms: u64) -> Result<Option<Nonce>, BeaconError> {
        let Some(deadline) = self.next_rotation_ms else {
            return Ok(None);
        };
        if now_ms < deadline {
            return Ok(None);
        }
        let mut next = deadline + self.rotation_interval_ms;
        while next <= now_ms {
            next += self.rotation_interval_ms;
        }
        self.next_rotation_ms = Some(next);
        self.rotate().map(Some)
    }

    /// Stop advertising immediately. Idempotent.
    pub fn stop(&mut self) {
        self.next_rotation_ms = None;
        if self.current.take().is_some() {
            self.advertiser.stop_advertising();
            tracing::info!(rotations = self.rotations, "beacon stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_rotation_ms.is_some()
    }

    pub fn current(&self) -> Option<&AdvertisementPayload> {
        self.current.as_ref()
    }

    pub fn current_nonce(&self) -> Option<Nonce> {
        self.current.as_ref().map(|p| p.identifier.nonce())
    }

    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn advertiser(&self) -> &A {
        &self.advertiser
    }
}
