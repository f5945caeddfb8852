//! Nullable proof service: in-process prover and verifier.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use proxima_proof::{ProofArtifact, ProofError, ProofVerifier, Prover};
use proxima_types::Nonce;
use serde_json::json;

#[derive(Debug)]
struct Inner {
    proved: Vec<Nonce>,
    verified: usize,
    prove_error: Option<ProofError>,
    verify_answer: Result<bool, ProofError>,
    delay: Duration,
}

/// Proves any nonce and, by default, verifies every proof it produced.
///
/// Clones share the same log.
#[derive(Clone, Debug)]
pub struct NullProofService {
    inner: Arc<Mutex<Inner>>,
}

impl NullProofService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                proved: Vec::new(),
                verified: 0,
                prove_error: None,
                verify_answer: Ok(true),
                delay: Duration::ZERO,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Each prove and verify call sleeps this long first (tokio time).
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = delay;
        self
    }

    pub fn fail_prove(&self, error: ProofError) {
        self.lock().prove_error = Some(error);
    }

    pub fn set_verify_answer(&self, answer: Result<bool, ProofError>) {
        self.lock().verify_answer = answer;
    }

    /// Nonces a proof was requested for, in order.
    pub fn proved(&self) -> Vec<Nonce> {
        self.lock().proved.clone()
    }

    pub fn verified(&self) -> usize {
        self.lock().verified
    }
}

impl Default for NullProofService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prover for NullProofService {
    async fn prove(&self, nonce: &Nonce) -> Result<ProofArtifact, ProofError> {
        let (delay, error) = {
            let mut inner = self.lock();
            inner.proved.push(*nonce);
            (inner.delay, inner.prove_error.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = error {
            return Err(error);
        }
        Ok(ProofArtifact {
            proof: json!({ "protocol": "null", "nonce": nonce.to_hex() }),
            public_signals: vec![json!(nonce.to_hex())],
        })
    }
}

#[async_trait]
impl ProofVerifier for NullProofService {
    async fn verify(&self, _artifact: &ProofArtifact) -> Result<bool, ProofError> {
        let (delay, answer) = {
            let mut inner = self.lock();
            inner.verified += 1;
            (inner.delay, inner.verify_answer.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxima_proof::{run_round_trip, ProofOutcome};

    #[tokio::test]
    async fn confirms_by_default() {
        let service = NullProofService::new();
        let report = run_round_trip(&service, &service, Nonce::new([1; 8])).await;
        assert_eq!(report.outcome, ProofOutcome::Confirmed);
        assert_eq!(service.proved(), vec![Nonce::new([1; 8])]);
        assert_eq!(service.verified(), 1);
    }

    #[tokio::test]
    async fn prove_failure_never_verifies() {
        let service = NullProofService::new();
        service.fail_prove(ProofError::ProveDecode("garbage".into()));
        let report = run_round_trip(&service, &service, Nonce::new([1; 8])).await;
        assert_eq!(report.outcome.message(), "Decode /prove error: garbage");
        assert_eq!(service.verified(), 0);
    }
}
