use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid parameters: {0}")]
    Types(#[from] proxima_types::TypesError),

    #[error("beacon error: {0}")]
    Beacon(#[from] proxima_beacon::BeaconError),

    #[error("presence error: {0}")]
    Presence(#[from] proxima_presence::PresenceError),

    #[error("classifier error: {0}")]
    Classifier(#[from] proxima_presence::ClassifierError),

    #[error("attendance error: {0}")]
    Attendance(#[from] proxima_attendance::AttendanceError),

    #[error("proof error: {0}")]
    Proof(#[from] proxima_proof::ProofError),

    #[error("config error: {0}")]
    Config(String),

    #[error("replay line {line}: {reason}")]
    Replay { line: usize, reason: String },

    #[error("session has stopped")]
    SessionClosed,

    #[error("task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("status server error: {0}")]
    StatusServer(String),
}
