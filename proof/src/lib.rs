//! Proof orchestration.
//!
//! When a new nonce is observed while the device is with its user, a proof
//! bound to that nonce is requested from the prover and the result submitted
//! to the verifier. Each nonce gets one round trip and one report; nothing is
//! retried.

pub mod artifact;
pub mod client;
pub mod error;
pub mod orchestrator;
pub mod round_trip;

pub use artifact::{ProofArtifact, ProveRequest, VerifyResponse};
pub use client::{HttpProofService, ProofVerifier, Prover};
pub use error::ProofError;
pub use orchestrator::{ProofDecision, ProofOrchestrator, ProofSkip};
pub use round_trip::{run_round_trip, ProofOutcome, ProofReport};
