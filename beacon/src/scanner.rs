//! Nonce scanner: turns raw advertisements into nonce-observed events.
//!
//! Filtering order: marker text, then the identifier prefix. Matching
//! observations always refresh the last-beacon time (range tracking), but a
//! nonce-observed event fires only when the nonce differs from the last one
//! this scanner emitted.

use proxima_types::{Nonce, BEACON_MARKER, BEACON_PREFIX};

use crate::Advertisement;

/// A nonce seen for the first time since the previous different nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NonceObserved {
    pub nonce: Nonce,
    pub observed_at_ms: u64,
}

/// Why an advertisement was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Local name missing or not exactly the marker.
    MarkerMismatch,
    /// No 128-bit service id in first position.
    MissingIdentifier,
    /// The identifier does not start with the fixed prefix.
    PrefixMismatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    Rejected(RejectReason),
    /// Matching beacon, same nonce as last emitted.
    Duplicate(Nonce),
    Observed(NonceObserved),
}

/// Counters kept by the scanner for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub seen: u64,
    pub rejected: u64,
    pub duplicates: u64,
    pub emitted: u64,
}

pub struct NonceScanner {
    marker: String,
    prefix: [u8; 8],
    last_seen: Option<Nonce>,
    last_beacon_ms: Option<u64>,
    stats: ScanStats,
}

impl NonceScanner {
    pub fn new() -> Self {
        Self::with_identity(BEACON_PREFIX, BEACON_MARKER)
    }

    pub fn with_identity(prefix: [u8; 8], marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            prefix,
            last_seen: None,
            last_beacon_ms: None,
            stats: ScanStats::default(),
        }
    }

    /// Process one advertisement observed at `now_ms`.
    pub fn observe(&mut self, adv: &Advertisement, now_ms: u64) -> ScanOutcome {
        self.stats.seen += 1;

        if adv.local_name.as_deref() != Some(self.marker.as_str()) {
            return self.reject(RejectReason::MarkerMismatch);
        }
        let Some(identifier) = adv.service_ids.first().and_then(|id| id.as_identifier()) else {
            return self.reject(RejectReason::MissingIdentifier);
        };
        if !identifier.has_prefix(&self.prefix) {
            return self.reject(RejectReason::PrefixMismatch);
        }

        self.last_beacon_ms = Some(now_ms);

        let nonce = identifier.nonce();
        if self.last_seen == Some(nonce) {
            self.stats.duplicates += 1;
            return ScanOutcome::Duplicate(nonce);
        }
        self.last_seen = Some(nonce);
        self.stats.emitted += 1;
        tracing::debug!(nonce = %nonce, rssi = ?adv.rssi, "scanner extracted nonce");
        ScanOutcome::Observed(NonceObserved {
            nonce,
            observed_at_ms: now_ms,
        })
    }

    fn reject(&mut self, reason: RejectReason) -> ScanOutcome {
        self.stats.rejected += 1;
        tracing::trace!(?reason, "advertisement ignored");
        ScanOutcome::Rejected(reason)
    }

    /// Time of the most recent matching observation, duplicates included.
    pub fn last_beacon_ms(&self) -> Option<u64> {
        self.last_beacon_ms
    }

    pub fn last_seen(&self) -> Option<Nonce> {
        self.last_seen
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Forget the dedup cache and the last beacon time.
    pub fn reset(&mut self) {
        self.last_seen = None;
        self.last_beacon_ms = None;
    }
}

impl Default for NonceScanner {
    fn default() -> Self {
        Self::new()
    }
}
