//! Read-only HTTP status endpoints.
//!
//! - `GET /metrics`: Prometheus text exposition of [`EngineMetrics`].
//! - `GET /snapshot`: the latest [`EngineSnapshot`] as JSON.
//! - `GET /health`: liveness probe.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::event::EngineSnapshot;
use crate::metrics::EngineMetrics;
use crate::shutdown::ShutdownSignal;
use crate::NodeError;

/// Shared state behind the status routes.
#[derive(Clone)]
pub struct StatusState {
    pub metrics: Arc<EngineMetrics>,
    pub snapshot: watch::Receiver<EngineSnapshot>,
}

pub struct StatusServer {
    pub port: u16,
    pub state: StatusState,
}

impl StatusServer {
    pub fn new(port: u16, state: StatusState) -> Self {
        Self { port, state }
    }

    /// Bind on all interfaces and serve until shutdown.
    pub async fn start(&self, shutdown: ShutdownSignal) -> Result<(), NodeError> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(%addr, "status server listening");
        serve(listener, self.state.clone(), shutdown).await
    }
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Serve on an already bound listener until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: StatusState,
    mut shutdown: ShutdownSignal,
) -> Result<(), NodeError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
        .map_err(|e| NodeError::StatusServer(e.to_string()))
}

async fn metrics_handler(State(state): State<StatusState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn snapshot_handler(State(state): State<StatusState>) -> Json<EngineSnapshot> {
    Json(state.snapshot.borrow().clone())
}
