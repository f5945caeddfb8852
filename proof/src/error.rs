use thiserror::Error;

/// Failures of one proof round trip. The display strings are the messages
/// surfaced to the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProofError {
    /// `/prove` could not be reached or answered with a non-success status.
    #[error("Prove HTTP error: {0}")]
    ProveTransport(String),

    /// `/prove` answered but the body is not a proof artifact.
    #[error("Decode /prove error: {0}")]
    ProveDecode(String),

    #[error("Verify error: {0}")]
    VerifyTransport(String),

    #[error("Bad verify response")]
    VerifyDecode(String),
}

impl ProofError {
    /// Transport failures release the nonce; decode failures abandon it.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ProveTransport(_) | Self::VerifyTransport(_))
    }
}
