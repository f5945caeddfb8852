//! One prove-then-verify round trip.

use proxima_types::Nonce;
use tokio::time::Instant;
use tracing::{info, warn, Instrument};

use crate::{ProofError, ProofVerifier, Prover};

#[derive(Clone, Debug, PartialEq)]
pub enum ProofOutcome {
    Confirmed,
    InvalidProof,
    Failed(ProofError),
}

impl ProofOutcome {
    /// User-facing message for this outcome.
    pub fn message(&self) -> String {
        match self {
            Self::Confirmed => "Attendance confirmed".to_string(),
            Self::InvalidProof => "Invalid proof".to_string(),
            Self::Failed(e) => e.to_string(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Final report for one nonce.
#[derive(Clone, Debug, PartialEq)]
pub struct ProofReport {
    pub nonce: Nonce,
    pub outcome: ProofOutcome,
    pub latency_ms: u64,
}

/// Request a proof for `nonce`, then verify it. Neither step is retried.
pub async fn run_round_trip(
    prover: &dyn Prover,
    verifier: &dyn ProofVerifier,
    nonce: Nonce,
) -> ProofReport {
    let span = tracing::info_span!("proof_round_trip", nonce = %nonce);
    async move {
        let started = Instant::now();
        let outcome = match prover.prove(&nonce).await {
            Ok(artifact) => match verifier.verify(&artifact).await {
                Ok(true) => ProofOutcome::Confirmed,
                Ok(false) => ProofOutcome::InvalidProof,
                Err(e) => ProofOutcome::Failed(e),
            },
            Err(e) => ProofOutcome::Failed(e),
        };
        let latency_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            ProofOutcome::Failed(e) => warn!(error = %e, latency_ms, "proof round trip failed"),
            other => info!(outcome = %other.message(), latency_ms, "proof round trip finished"),
        }
        ProofReport {
            nonce,
            outcome,
            latency_ms,
        }
    }
    .instrument(span)
    .await
}
