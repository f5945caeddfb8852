//! Wire types of the proof service.

use proxima_types::Nonce;
use serde::{Deserialize, Serialize};

/// Body of `POST /prove`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProveRequest {
    /// 16 lowercase hex characters.
    pub nonce_hex: String,
}

impl ProveRequest {
    pub fn for_nonce(nonce: &Nonce) -> Self {
        Self {
            nonce_hex: nonce.to_hex(),
        }
    }
}

/// Returned by `/prove`, submitted unchanged to `/verify`.
///
/// The proof body is opaque here; only its JSON shape is preserved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofArtifact {
    pub proof: serde_json::Value,
    pub public_signals: Vec<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
}
