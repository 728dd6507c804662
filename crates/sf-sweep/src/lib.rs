//! sf-sweep: parametric sweeps over engine-backed simulation cases.
//!
//! Provides:
//! - Parameter grids and their Cartesian product (`grid`)
//! - Case kinds, parameters and build templates (`case`)
//! - The case builder that drives the engine contract (`builder`)
//! - The case runner, which turns every failure into data (`runner`)
//! - Result records and the sink seam (`result`)
//! - The sweep driver (`driver`)
//!
//! A single case moves through `Built → Solving → {Succeeded, Failed} →
//! Closed`. Nothing a case does can abort the sweep; only the result sink
//! can.

pub mod builder;
pub mod case;
pub mod driver;
pub mod error;
pub mod grid;
pub mod result;
pub mod runner;

pub use builder::{BuiltCase, build_case};
pub use case::{CaseKind, CaseParams, CaseTemplates, ColumnParams, ColumnTemplate, PfrParams, PfrTemplate};
pub use driver::{CaseEvent, SweepPlan, SweepProgressEvent, SweepSpec, SweepSummary, run_sweep};
pub use error::{SinkError, SweepError, SweepResult};
pub use grid::{GridAxis, GridPoint, ParameterGrid, RangeSpec, Spacing};
pub use result::{
    CaseFailure, CaseOutcome, CaseOutputs, CaseResult, ColumnOutputs, FailureStage, FieldValue,
    MAX_ERROR_CHARS, PfrOutputs, ResultCollection, ResultSink,
};
pub use runner::{CaseState, run_case};
