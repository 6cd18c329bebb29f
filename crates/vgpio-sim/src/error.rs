//! Error types for the virtual bench

use thiserror::Error;

/// Result type for bench operations
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// The test body was still running when the cycle limit elapsed
    #[error("simulation reached its limit of {limit} cycles")]
    CycleLimit { limit: u64 },

    #[error("signal '{0}' is already registered")]
    DuplicateSignal(String),

    #[error("no signal named '{0}'")]
    UnknownSignal(String),

    #[error("invalid logic value '{text}': {reason}")]
    InvalidValue { text: String, reason: String },

    #[error("failed to build simulation runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
