//! Commands into the attendance session and what it publishes back.

use serde::Serialize;

use proxima_attendance::{AttendanceError, RecordOutcome, SkipReason};
use proxima_beacon::{Advertisement, RangeState};
use proxima_types::{AttendanceVerdict, MotionSample, PresenceState, PresenceStatus};

/// Sensor callbacks and user controls, delivered to the coordinating task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Begin capture: range tracking, presence classification, and a fresh
    /// attendance window. While running, only the window is restarted and a
    /// pending one is discarded.
    Start,
    /// Stop capture. Pending windows are discarded without a verdict.
    Stop,
    /// Stop and end the session task.
    Shutdown,
    Motion(MotionSample),
    Advertisement(Advertisement),
    /// The motion source could not be started.
    MotionUnavailable(String),
    /// The radio could not be started for scanning.
    RadioUnavailable(String),
}

/// Outcome of the record write that follows a verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum RecordNotice {
    Recorded,
    /// Skipped because no credential is configured.
    SkippedNoCredential,
    Failed(String),
}

impl From<Result<RecordOutcome, AttendanceError>> for RecordNotice {
    fn from(result: Result<RecordOutcome, AttendanceError>) -> Self {
        match result {
            Ok(RecordOutcome::Recorded) => Self::Recorded,
            Ok(RecordOutcome::Skipped(SkipReason::NoCredential)) => Self::SkippedNoCredential,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Events published to subscribers of a running session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum EngineNotice {
    PresenceChanged { state: PresenceState },
    ClassifierFailed { reason: String },
    MotionUnavailable { reason: String },
    RadioUnavailable { reason: String },
    RangeChanged { state: RangeState },
    NonceObserved { nonce: String, at_ms: u64 },
    ProofRequested { nonce: String },
    ProofReported {
        nonce: String,
        message: String,
        confirmed: bool,
        latency_ms: u64,
    },
    SampleTaken { index: usize, present: bool },
    Verdict { verdict: AttendanceVerdict },
    Record { record: RecordNotice },
}

/// Point-in-time view of a session, published after every step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub running: bool,
    pub presence: PresenceStatus,
    pub range: RangeState,
    /// Hex of the last nonce the scanner emitted.
    pub last_nonce: Option<String>,
    pub last_beacon_ms: Option<u64>,
    pub window_open: bool,
    pub samples: Vec<bool>,
    pub last_verdict: Option<AttendanceVerdict>,
    pub proofs_in_flight: usize,
    pub last_proof_message: Option<String>,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            running: false,
            presence: PresenceStatus::Idle,
            range: RangeState::InRange,
            last_nonce: None,
            last_beacon_ms: None,
            window_open: false,
            samples: Vec::new(),
            last_verdict: None,
            proofs_in_flight: 0,
            last_proof_message: None,
        }
    }
}
