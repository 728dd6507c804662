//! Shared application service layer for sweepflow.
//!
//! The CLI talks to this crate only. It loads and validates studies,
//! opens the engine session, wires the result sink and writes the run
//! manifest.

pub mod error;
pub mod progress;
pub mod run_service;
pub mod study_service;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, resolve_output_path, run_loaded_study, run_study,
};
pub use study_service::{
    PlannedCase, StudySummary, SweepOverview, init_study, load_study, plan_cases, save_study,
    summarize_study,
};
