use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttendanceError {
    /// The attendance service could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The attendance service answered with a non-success status.
    #[error("attendance service rejected the record: HTTP {status}")]
    Rejected { status: u16 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
