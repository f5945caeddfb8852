//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while constructing or parsing the fundamental types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid service uuid: {0}")]
    InvalidUuid(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}
