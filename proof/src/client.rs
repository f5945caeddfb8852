//! Prover and verifier collaborators, and their HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use proxima_types::Nonce;
use tracing::debug;

use crate::{ProofArtifact, ProofError, ProveRequest, VerifyResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Produces a proof bound to a nonce.
#[async_trait]
pub trait Prover: Send + Sync {
    async fn prove(&self, nonce: &Nonce) -> Result<ProofArtifact, ProofError>;
}

/// Checks a proof produced by a [`Prover`].
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(&self, artifact: &ProofArtifact) -> Result<bool, ProofError>;
}

/// Client for a proof service exposing `POST /prove` and `POST /verify`.
#[derive(Clone)]
pub struct HttpProofService {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpProofService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, String> {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "proof service request");
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("request timed out: {e}")
                } else if e.is_connect() {
                    format!("connection failed: {e}")
                } else {
                    e.to_string()
                }
            })?;
        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Prover for HttpProofService {
    async fn prove(&self, nonce: &Nonce) -> Result<ProofArtifact, ProofError> {
        let response = self
            .post("prove", &ProveRequest::for_nonce(nonce))
            .await
            .map_err(ProofError::ProveTransport)?;
        response
            .json::<ProofArtifact>()
            .await
            .map_err(|e| ProofError::ProveDecode(e.to_string()))
    }
}

#[async_trait]
impl ProofVerifier for HttpProofService {
    async fn verify(&self, artifact: &ProofArtifact) -> Result<bool, ProofError> {
        let response = self
            .post("verify", artifact)
            .await
            .map_err(ProofError::VerifyTransport)?;
        response
            .json::<VerifyResponse>()
            .await
            .map(|r| r.verified)
            .map_err(|e| ProofError::VerifyDecode(e.to_string()))
    }
}
