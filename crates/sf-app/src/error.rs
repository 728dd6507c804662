//! Error types for the sf-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Study error: {0}")]
    Study(String),

    #[error("Failed to read study file: {path}")]
    StudyFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write study file: {path}")]
    StudyFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Study validation failed: {0}")]
    Validation(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Sweep error: {0}")]
    Sweep(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sf-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<sf_study::StudyError> for AppError {
    fn from(err: sf_study::StudyError) -> Self {
        match err {
            sf_study::StudyError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Study(other.to_string()),
        }
    }
}

impl From<sf_study::ValidationError> for AppError {
    fn from(err: sf_study::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<sf_engine::EngineError> for AppError {
    fn from(err: sf_engine::EngineError) -> Self {
        AppError::Engine(err.to_string())
    }
}

impl From<sf_sweep::SweepError> for AppError {
    fn from(err: sf_sweep::SweepError) -> Self {
        AppError::Sweep(err.to_string())
    }
}

impl From<sf_results::ResultsError> for AppError {
    fn from(err: sf_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
