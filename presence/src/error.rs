use thiserror::Error;

/// Failures of the learned classifier collaborator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("model error: {0}")]
    Model(String),
}

#[derive(Debug, Error)]
pub enum PresenceError {
    /// The motion source cannot be started; permanent for the session.
    #[error("motion sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("dataset line {line}: {reason}")]
    Dataset { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
