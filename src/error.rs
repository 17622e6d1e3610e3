//! Error types for the timetable solver.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimetableError>;

#[derive(Error, Debug)]
pub enum TimetableError {
    /// Input that cannot be turned into a model; raised before the solver runs.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Solver output that contradicts the model it was given.
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
