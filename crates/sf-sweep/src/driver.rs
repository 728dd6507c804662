//! Sweep driver.
//!
//! Walks every grid of a plan in declared order, runs each case and hands
//! the result to the sink before moving on. Case failures are recorded and
//! the sweep continues; only plan and sink errors stop it.

use std::collections::BTreeMap;
use std::time::Instant;

use sf_engine::EngineSession;

use crate::case::{CaseKind, CaseParams, CaseTemplates};
use crate::error::SweepResult;
use crate::grid::{GridPoint, ParameterGrid};
use crate::result::{CaseOutcome, FailureStage, ResultSink};
use crate::runner::run_case;

/// One grid swept for one case kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    pub kind: CaseKind,
    pub grid: ParameterGrid,
    /// Parameters held constant across the grid.
    pub fixed: BTreeMap<String, f64>,
}

impl SweepSpec {
    pub fn new(kind: CaseKind, grid: ParameterGrid) -> Self {
        Self {
            kind,
            grid,
            fixed: BTreeMap::new(),
        }
    }

    pub fn with_fixed(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fixed.insert(name.into(), value);
        self
    }
}

/// Everything needed to run a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub sweeps: Vec<SweepSpec>,
    pub templates: CaseTemplates,
    pub property_package: String,
}

impl SweepPlan {
    /// Total number of cases across all sweeps.
    pub fn len(&self) -> usize {
        self.sweeps.iter().map(|s| s.grid.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every grid point in execution order, without resolving parameters.
    pub fn points(&self) -> Vec<(CaseKind, GridPoint)> {
        self.sweeps
            .iter()
            .flat_map(|s| s.grid.points().into_iter().map(move |p| (s.kind, p)))
            .collect()
    }

    /// Resolve every point into case parameters.
    ///
    /// Fails on the first parameter the case kind cannot use, before any
    /// case runs.
    pub fn cases(&self) -> SweepResult<Vec<CaseParams>> {
        let mut cases = Vec::with_capacity(self.len());
        for sweep in &self.sweeps {
            for point in sweep.grid.points() {
                cases.push(CaseParams::from_point(sweep.kind, &point, &sweep.fixed)?);
            }
        }
        Ok(cases)
    }

    /// Distinct case kinds in first-appearance order.
    pub fn kinds(&self) -> Vec<CaseKind> {
        let mut kinds = Vec::new();
        for sweep in &self.sweeps {
            if !kinds.contains(&sweep.kind) {
                kinds.push(sweep.kind);
            }
        }
        kinds
    }

    /// Sorted union of the field names of every case kind in the plan.
    pub fn schema(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> =
            self.kinds().into_iter().flat_map(|k| k.schema()).collect();
        fields.sort_unstable();
        fields.dedup();
        fields
    }
}

/// What happened to a case.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseEvent {
    Started,
    Succeeded { headline: String },
    Failed { stage: FailureStage, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepProgressEvent {
    pub index: usize,
    pub total: usize,
    pub kind: CaseKind,
    pub label: String,
    pub event: CaseEvent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_s: f64,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(SweepProgressEvent)>,
    index: usize,
    total: usize,
    params: &CaseParams,
    event: CaseEvent,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(SweepProgressEvent {
            index,
            total,
            kind: params.kind(),
            label: params.label(),
            event,
        });
    }
}

/// Run every case of `plan`, streaming results into `sink`.
pub fn run_sweep(
    session: &mut dyn EngineSession,
    plan: &SweepPlan,
    sink: &mut dyn ResultSink,
    mut progress_cb: Option<&mut dyn FnMut(SweepProgressEvent)>,
) -> SweepResult<SweepSummary> {
    let cases = plan.cases()?;
    let total = cases.len();
    let started = Instant::now();

    sink.begin(&plan.schema())?;
    tracing::info!(
        total,
        backend = session.backend_name(),
        package = %plan.property_package,
        "Starting sweep"
    );

    let mut succeeded = 0;
    let mut failed = 0;
    for (index, params) in cases.iter().enumerate() {
        emit_progress(&mut progress_cb, index, total, params, CaseEvent::Started);

        let result = run_case(
            session,
            index,
            params,
            &plan.templates,
            &plan.property_package,
        );
        sink.accept(&result)?;

        let event = match &result.outcome {
            CaseOutcome::Succeeded(outputs) => {
                succeeded += 1;
                CaseEvent::Succeeded {
                    headline: outputs.headline(),
                }
            }
            CaseOutcome::Failed(failure) => {
                failed += 1;
                CaseEvent::Failed {
                    stage: failure.stage,
                    message: failure.message.clone(),
                }
            }
        };
        emit_progress(&mut progress_cb, index, total, params, event);
    }

    sink.finish()?;

    let summary = SweepSummary {
        total,
        succeeded,
        failed,
        elapsed_s: started.elapsed().as_secs_f64(),
    };
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Sweep finished"
    );
    Ok(summary)
}
