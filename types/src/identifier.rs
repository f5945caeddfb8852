//! The 16-byte identifier a beacon advertises: fixed prefix followed by the nonce.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Nonce, TypesError, NONCE_LEN};

/// Fixed first half of every advertised identifier. Never changes.
pub const BEACON_PREFIX: [u8; 8] = [0xD4, 0xF5, 0x6A, 0x24, 0x9C, 0xDE, 0x4B, 0x12];

/// Local-name marker carried next to the identifier, used as a coarse filter.
pub const BEACON_MARKER: &str = "ZK-Attendance";

/// Total length of an advertised identifier.
pub const IDENTIFIER_LEN: usize = 16;

/// `prefix ‖ nonce`, in raw byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdvertisedIdentifier([u8; IDENTIFIER_LEN]);

impl AdvertisedIdentifier {
    pub fn new(bytes: [u8; IDENTIFIER_LEN]) -> Self {
        Self(bytes)
    }

    /// Concatenate a prefix and a nonce.
    pub fn compose(prefix: [u8; 8], nonce: &Nonce) -> Self {
        let mut bytes = [0u8; IDENTIFIER_LEN];
        bytes[..8].copy_from_slice(&prefix);
        bytes[8..].copy_from_slice(nonce.as_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LEN] {
        &self.0
    }

    pub fn prefix(&self) -> [u8; 8] {
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&self.0[..8]);
        prefix
    }

    /// The trailing 8 bytes, interpreted as a nonce.
    pub fn nonce(&self) -> Nonce {
        let mut bytes = [0u8; NONCE_LEN];
        bytes.copy_from_slice(&self.0[8..]);
        Nonce::new(bytes)
    }

    pub fn has_prefix(&self, prefix: &[u8; 8]) -> bool {
        &self.0[..8] == prefix
    }

    /// Render as a 128-bit service UUID (`8-4-4-4-12`, upper-case hex).
    pub fn to_uuid_string(&self) -> String {
        let hex = hex::encode_upper(self.0);
        format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }

    /// Parse a service UUID string. Hyphens are optional, case is ignored.
    pub fn parse_uuid(s: &str) -> Result<Self, TypesError> {
        let compact: String = s.chars().filter(|c| *c != '-').collect();
        if compact.len() != IDENTIFIER_LEN * 2 {
            return Err(TypesError::InvalidUuid(s.to_string()));
        }
        let bytes = hex::decode(&compact).map_err(|_| TypesError::InvalidUuid(s.to_string()))?;
        let mut array = [0u8; IDENTIFIER_LEN];
        array.copy_from_slice(&bytes);
        Ok(Self(array))
    }
}

impl TryFrom<&[u8]> for AdvertisedIdentifier {
    type Error = TypesError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; IDENTIFIER_LEN] =
            bytes.try_into().map_err(|_| TypesError::InvalidLength {
                expected: IDENTIFIER_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for AdvertisedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdvertisedIdentifier({})", self.to_uuid_string())
    }
}

impl fmt::Display for AdvertisedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nonce() -> Nonce {
        Nonce::new([1, 2, 3, 4, 5, 6, 7, 8])
    }

    #[test]
    fn compose_places_prefix_then_nonce() {
        let id = AdvertisedIdentifier::compose(BEACON_PREFIX, &nonce());
        assert_eq!(&id.as_bytes()[..8], &BEACON_PREFIX);
        assert_eq!(id.nonce(), nonce());
        assert!(id.has_prefix(&BEACON_PREFIX));
    }

    #[test]
    fn uuid_string_uses_fixed_prefix() {
        let id = AdvertisedIdentifier::compose(BEACON_PREFIX, &nonce());
        assert_eq!(id.to_uuid_string(), "D4F56A24-9CDE-4B12-0102-030405060708");
    }

    #[test]
    fn parse_uuid_accepts_lower_case_and_missing_hyphens() {
        let id = AdvertisedIdentifier::parse_uuid("d4f56a249cde4b120102030405060708").unwrap();
        assert_eq!(id.nonce(), nonce());
        let again = AdvertisedIdentifier::parse_uuid(&id.to_uuid_string()).unwrap();
        assert_eq!(id, again);
    }

    #[test]
    fn parse_uuid_rejects_short_strings() {
        assert!(AdvertisedIdentifier::parse_uuid("DEAD").is_err());
    }

    #[test]
    fn try_from_slice_checks_length() {
        let err = AdvertisedIdentifier::try_from(&[0u8; 15][..]).unwrap_err();
        assert_eq!(
            err,
            TypesError::InvalidLength {
                expected: 16,
                actual: 15
            }
        );
    }
}
