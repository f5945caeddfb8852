//! Presence-gated proof requests, deduplicated per nonce.

use std::collections::HashSet;

use proxima_types::Nonce;
use tracing::{debug, info, warn};

use crate::{ProofOutcome, ProofReport};

/// Why a nonce did not start a round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofSkip {
    /// The smoothed presence state is not "with user".
    NotWithUser,
    /// Same bytes as the last nonce a proof was requested for.
    AlreadyRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofDecision {
    /// Start a round trip for this nonce; report it back with
    /// [`ProofOrchestrator::complete`].
    Request(Nonce),
    Skip(ProofSkip),
}

/// Decides when to request proofs and makes sure each nonce reports once.
///
/// Round trips run elsewhere; this type only keeps the bookkeeping. Presence
/// changes never cancel a round trip already in flight.
#[derive(Debug, Default)]
pub struct ProofOrchestrator {
    last_requested: Option<Nonce>,
    in_flight: HashSet<Nonce>,
    requested: u64,
    confirmed: u64,
    invalid: u64,
    failed: u64,
}

impl ProofOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a nonce-observed event.
    pub fn on_nonce(&mut self, nonce: Nonce, with_user: bool) -> ProofDecision {
        if !with_user {
            debug!(%nonce, "not with user; no proof requested");
            return ProofDecision::Skip(ProofSkip::NotWithUser);
        }
        if self.last_requested == Some(nonce) {
            debug!(%nonce, "proof already requested for this nonce");
            return ProofDecision::Skip(ProofSkip::AlreadyRequested);
        }
        self.last_requested = Some(nonce);
        self.in_flight.insert(nonce);
        self.requested += 1;
        info!(%nonce, in_flight = self.in_flight.len(), "requesting proof");
        ProofDecision::Request(nonce)
    }

    /// Accept the result of a round trip. Returns the report the first time a
    /// requested nonce completes and `None` for anything else.
    pub fn complete(&mut self, report: ProofReport) -> Option<ProofReport> {
        if !self.in_flight.remove(&report.nonce) {
            warn!(nonce = %report.nonce, "completion for a nonce that is not in flight");
            return None;
        }
        match &report.outcome {
            ProofOutcome::Confirmed => self.confirmed += 1,
            ProofOutcome::InvalidProof => self.invalid += 1,
            ProofOutcome::Failed(e) => {
                self.failed += 1;
                if e.is_transport() {
                    debug!(nonce = %report.nonce, "transport failure; nonce released");
                }
            }
        }
        Some(report)
    }

    pub fn is_in_flight(&self, nonce: &Nonce) -> bool {
        self.in_flight.contains(nonce)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn last_requested(&self) -> Option<Nonce> {
        self.last_requested
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn confirmed(&self) -> u64 {
        self.confirmed
    }

    pub fn invalid(&self) -> u64 {
        self.invalid
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}
