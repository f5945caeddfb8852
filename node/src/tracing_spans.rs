//! Pre-built [`tracing::Span`] constructors for common engine operations.
//!
//! Using consistent span names and field sets across the codebase makes it
//! easy to filter and correlate log lines from one session or one window.

use proxima_types::Nonce;
use tracing::{info_span, Span};

/// Span covering the whole life of an attendance session task.
pub fn session_span(session_id: u64) -> Span {
    info_span!("session", id = session_id)
}

/// Span covering one attendance window, from `start` to its verdict.
pub fn attendance_window_span(started_at_ms: u64) -> Span {
    info_span!("attendance_window", started_at_ms)
}

/// Span covering the record write that follows a verdict.
pub fn record_span(status: &str) -> Span {
    info_span!("attendance_record", status = %status)
}

/// Span covering the proof round trip spawned for one nonce.
pub fn proof_task_span(nonce: &Nonce) -> Span {
    info_span!("proof_task", nonce = %nonce)
}

/// Span covering the beacon service task.
pub fn beacon_span(marker: &str) -> Span {
    info_span!("beacon", marker = %marker)
}
