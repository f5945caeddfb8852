//! The rotating beacon nonce.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Length of a beacon nonce in bytes.
pub const NONCE_LEN: usize = 8;

/// An 8-byte random value advertised by the beacon for one rotation interval.
///
/// Uniqueness is probabilistic: two nonces are "different" when their bytes differ.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn new(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    /// Build a nonce from a slice that must be exactly [`NONCE_LEN`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let array: [u8; NONCE_LEN] =
            bytes.try_into().map_err(|_| TypesError::InvalidLength {
                expected: NONCE_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Lower-case, 16-character hex form used on the proof-request wire.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let bytes = hex::decode(s).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.to_hex())
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_sixteen_lowercase_chars() {
        let nonce = Nonce::new([0xAB, 0xCD, 0x01, 0x02, 0x03, 0x04, 0x05, 0xFF]);
        assert_eq!(nonce.to_hex(), "abcd0102030405ff");
        assert_eq!(nonce.to_hex().len(), 16);
    }

    #[test]
    fn from_hex_accepts_upper_case() {
        let nonce = Nonce::from_hex("ABCD0102030405FF").unwrap();
        assert_eq!(nonce.as_bytes()[0], 0xAB);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Nonce::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypesError::InvalidLength {
                expected: 8,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            Nonce::from_hex("zz00000000000000"),
            Err(TypesError::InvalidHex(_))
        ));
    }
}
