//! Persistence of attendance verdicts.
//!
//! `POST {base}/attendance` with `Authorization: Bearer <token>` and
//! `{"status": "present"|"absent", "timestamp": <unix secs>}`. Without a
//! token the write is skipped.

use std::time::Duration;

use async_trait::async_trait;
use proxima_types::{AttendanceStatus, AttendanceVerdict};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::AttendanceError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of an attendance write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub status: AttendanceStatus,
    pub timestamp: u64,
}

impl From<&AttendanceVerdict> for AttendanceRecord {
    fn from(verdict: &AttendanceVerdict) -> Self {
        Self {
            status: verdict.status,
            timestamp: verdict.decided_at.as_secs(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No bearer token is configured.
    NoCredential,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    Skipped(SkipReason),
}

/// Storage collaborator for verdicts. One call per verdict, never retried.
#[async_trait]
pub trait AttendanceRecorder: Send + Sync {
    async fn record(&self, record: &AttendanceRecord) -> Result<RecordOutcome, AttendanceError>;
}

pub struct HttpAttendanceRecorder {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAttendanceRecorder {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            // An empty token is the same as none.
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl AttendanceRecorder for HttpAttendanceRecorder {
    async fn record(&self, record: &AttendanceRecord) -> Result<RecordOutcome, AttendanceError> {
        let Some(token) = &self.token else {
            info!(status = %record.status, "no auth token; attendance record skipped");
            return Ok(RecordOutcome::Skipped(SkipReason::NoCredential));
        };

        let url = format!("{}/attendance", self.base_url);
        debug!(%url, status = %record.status, "posting attendance record");
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttendanceError::Transport(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    AttendanceError::Transport(format!("connection failed: {e}"))
                } else {
                    AttendanceError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttendanceError::Rejected {
                status: status.as_u16(),
            });
        }
        info!(status = %record.status, "attendance recorded");
        Ok(RecordOutcome::Recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(Option<String>, AttendanceRecord)>>>;

    async fn handler(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Json(body): Json<AttendanceRecord>,
    ) -> StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let ok = auth.as_deref() == Some("Bearer secret");
        seen.lock().unwrap().push((auth, body));
        if ok {
            StatusCode::CREATED
        } else {
            StatusCode::UNAUTHORIZED
        }
    }

    async fn serve() -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/attendance", post(handler))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), seen)
    }

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            status: AttendanceStatus::Present,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn wire_body() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "present", "timestamp": 1_700_000_000u64 })
        );
    }

    #[tokio::test]
    async fn posts_with_bearer_token() {
        let (url, seen) = serve().await;
        let recorder = HttpAttendanceRecorder::new(url, Some("secret".into()));
        assert_eq!(recorder.record(&record()).await, Ok(RecordOutcome::Recorded));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, record());
    }

    #[tokio::test]
    async fn rejected_status_is_an_error() {
        let (url, _seen) = serve().await;
        let recorder = HttpAttendanceRecorder::new(url, Some("wrong".into()));
        assert_eq!(
            recorder.record(&record()).await,
            Err(AttendanceError::Rejected { status: 401 })
        );
    }

    #[tokio::test]
    async fn missing_token_skips_without_request() {
        let (url, seen) = serve().await;
        let recorder = HttpAttendanceRecorder::new(url, Some(String::new()));
        assert!(!recorder.has_credential());
        assert_eq!(
            recorder.record(&record()).await,
            Ok(RecordOutcome::Skipped(SkipReason::NoCredential))
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let recorder = HttpAttendanceRecorder::new("http://127.0.0.1:1", Some("secret".into()));
        assert!(matches!(
            recorder.record(&record()).await,
            Err(AttendanceError::Transport(_))
        ));
    }
}
