//! Sweep errors.
//!
//! These cover problems with the plan itself and with the result sink.
//! Case-level engine failures never show up here; they are recorded in
//! [`crate::CaseResult`].

use thiserror::Error;

pub type SweepResult<T> = Result<T, SweepError>;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown parameter '{name}' for {kind} cases")]
    UnknownParameter { name: String, kind: String },

    #[error("Result sink failed: {0}")]
    Sink(#[from] SinkError),
}

/// Failure reported by a result sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
