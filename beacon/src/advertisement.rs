//! Advertisement payloads as sent by the beacon and as observed by the scanner.

use proxima_types::AdvertisedIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BeaconError;

/// A service identifier carried in an advertisement.
///
/// Radio stacks report both 16-bit assigned numbers and full 128-bit UUIDs;
/// only the latter can carry a nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceId {
    Uuid16(u16),
    Uuid128(AdvertisedIdentifier),
}

impl ServiceId {
    /// Parse `"DEAD"`-style short ids or full `8-4-4-4-12` UUIDs.
    pub fn parse(s: &str) -> Result<Self, BeaconError> {
        let trimmed = s.trim();
        if trimmed.len() == 4 {
            return u16::from_str_radix(trimmed, 16)
                .map(Self::Uuid16)
                .map_err(|_| BeaconError::InvalidServiceId(s.to_string()));
        }
        AdvertisedIdentifier::parse_uuid(trimmed)
            .map(Self::Uuid128)
            .map_err(|_| BeaconError::InvalidServiceId(s.to_string()))
    }

    pub fn as_identifier(&self) -> Option<&AdvertisedIdentifier> {
        match self {
            Self::Uuid128(id) => Some(id),
            Self::Uuid16(_) => None,
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid16(short) => write!(f, "{short:04X}"),
            Self::Uuid128(id) => write!(f, "{id}"),
        }
    }
}

impl TryFrom<String> for ServiceId {
    type Error = BeaconError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.to_string()
    }
}

/// One advertisement as observed by the scanner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    /// Local-name field, if the advertiser set one.
    #[serde(default)]
    pub local_name: Option<String>,
    /// Advertised service ids, in the order the radio reported them.
    #[serde(default)]
    pub service_ids: Vec<ServiceId>,
    #[serde(default)]
    pub rssi: Option<i16>,
}

impl Advertisement {
    pub fn new(local_name: impl Into<String>, service_ids: Vec<ServiceId>) -> Self {
        Self {
            local_name: Some(local_name.into()),
            service_ids,
            rssi: None,
        }
    }

    /// Build the observation a scanner would see for a beacon payload.
    pub fn from_payload(payload: &AdvertisementPayload) -> Self {
        Self::new(
            payload.local_name.clone(),
            vec![ServiceId::Uuid128(payload.identifier)],
        )
    }
}

/// What the beacon hands to the radio on every rotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementPayload {
    pub local_name: String,
    pub identifier: AdvertisedIdentifier,
}

impl AdvertisementPayload {
    /// The identifier rendered as a 128-bit service UUID.
    pub fn service_uuid(&self) -> String {
        self.identifier.to_uuid_string()
    }
}
