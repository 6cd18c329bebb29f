//! Error types for scenario runs

use thiserror::Error;
use vgpio_sim::SimError;
use vgpio_sync::TimeoutError;

/// Result type for scenario operations
pub type Result<T> = std::result::Result<T, ScenarioError>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A milestone was not reached in time
    #[error("scenario '{scenario}' step {step} ({label}): {source}")]
    Milestone {
        scenario: String,
        step: usize,
        label: String,
        #[source]
        source: TimeoutError,
    },

    /// The firmware reported failure through the register
    #[error("scenario '{scenario}' step {step}: firmware reported error code {value:#x}")]
    ErrorCode {
        scenario: String,
        step: usize,
        value: u32,
    },

    #[error("scenario '{scenario}': {source}")]
    Simulation {
        scenario: String,
        #[source]
        source: SimError,
    },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("unknown built-in scenario '{0}'")]
    UnknownScenario(String),

    #[error("failed to parse scenario: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),
}
