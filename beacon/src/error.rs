use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BeaconError {
    /// The secure random source failed; no nonce can be produced.
    #[error("random source unavailable: {0}")]
    RandomUnavailable(String),

    /// The radio cannot be used for this session.
    #[error("radio unavailable: {0}")]
    RadioUnavailable(String),

    #[error("advertising failed: {0}")]
    Advertise(String),

    #[error("invalid service id: {0}")]
    InvalidServiceId(String),
}
