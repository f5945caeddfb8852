//! Secure random source for nonces.

use proxima_types::{Nonce, NONCE_LEN};

use crate::BeaconError;

/// Produces fresh nonces. A failure is fatal for the broadcaster.
pub trait NonceSource: Send {
    fn next_nonce(&mut self) -> Result<Nonce, BeaconError>;
}

/// Reads nonces from the operating system's CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn next_nonce(&mut self) -> Result<Nonce, BeaconError> {
        let mut bytes = [0u8; NONCE_LEN];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| BeaconError::RandomUnavailable(e.to_string()))?;
        Ok(Nonce::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_source_produces_distinct_nonces() {
        let mut source = OsNonceSource;
        let a = source.next_nonce().unwrap();
        let b = source.next_nonce().unwrap();
        // 2^-64 collision chance
        assert_ne!(a, b);
    }
}
