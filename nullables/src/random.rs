//! Nullable random: deterministic nonces.

use proxima_beacon::{BeaconError, NonceSource};
use proxima_types::Nonce;

enum Mode {
    /// Pre-configured values, cycled in order.
    Scripted(Vec<Nonce>),
    /// 1, 2, 3, ... as big-endian bytes.
    Sequential,
    Failing,
}

/// A deterministic nonce source for testing.
pub struct NullNonceSource {
    mode: Mode,
    index: usize,
}

impl NullNonceSource {
    /// Cycle through `nonces`. An empty list behaves like [`Self::failing`].
    pub fn new(nonces: Vec<Nonce>) -> Self {
        let mode = if nonces.is_empty() {
            Mode::Failing
        } else {
            Mode::Scripted(nonces)
        };
        Self { mode, index: 0 }
    }

    /// Every call yields a nonce different from the previous one.
    pub fn sequential() -> Self {
        Self {
            mode: Mode::Sequential,
            index: 0,
        }
    }

    /// Simulates an unavailable random source.
    pub fn failing() -> Self {
        Self {
            mode: Mode::Failing,
            index: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.index
    }
}

impl NonceSource for NullNonceSource {
    fn next_nonce(&mut self) -> Result<Nonce, BeaconError> {
        let i = self.index;
        let nonce = match &self.mode {
            Mode::Scripted(nonces) => nonces[i % nonces.len()],
            Mode::Sequential => Nonce::new((i as u64 + 1).to_be_bytes()),
            Mode::Failing => {
                return Err(BeaconError::RandomUnavailable("null random source".into()))
            }
        };
        self.index += 1;
        Ok(nonce)
    }
}
