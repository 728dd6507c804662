//! Run execution service.

use std::path::{Path, PathBuf};
use std::time::Instant;

use sf_engine::{EngineSession, EngineSettings, open_session};
use sf_results::{RunManifest, compute_study_hash, create_sink, write_manifest};
use sf_study::{OutputMode, Study};
use sf_sweep::{SweepProgressEvent, SweepSummary, run_sweep};

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};
use crate::study_service;

/// Command-line overrides of the study's output section.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub mode: Option<OutputMode>,
    pub no_manifest: bool,
}

/// Request to execute a study.
pub struct RunRequest<'a> {
    pub study_path: &'a Path,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub summary: SweepSummary,
    pub output_path: PathBuf,
    pub output_mode: OutputMode,
    pub manifest_path: Option<PathBuf>,
    pub manifest: Option<RunManifest>,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    case: Option<SweepProgressEvent>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        let mut event = RunProgressEvent::stage(stage, started.elapsed().as_secs_f64(), message);
        event.case = case;
        cb(event);
    }
}

/// Where the CSV goes: the override as given, else the study's path
/// relative to the study file.
pub fn resolve_output_path(study_path: &Path, study: &Study, options: &RunOptions) -> PathBuf {
    if let Some(output) = &options.output {
        return output.clone();
    }
    if study.output.path.is_absolute() {
        return study.output.path.clone();
    }
    match study_path.parent() {
        Some(dir) => dir.join(&study.output.path),
        None => study.output.path.clone(),
    }
}

/// Load a study file, open the configured engine and run every case.
pub fn run_study(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingStudy,
        started,
        Some(format!("Loading {}", request.study_path.display())),
        None,
    );
    let study = study_service::load_study(request.study_path)?;
    let mut options = request.options.clone();
    options.output = Some(resolve_output_path(
        request.study_path,
        &study,
        &request.options,
    ));

    emit_progress(
        &mut progress_cb,
        RunStage::OpeningSession,
        started,
        Some(format!("Opening {} engine", study.engine.backend)),
        None,
    );
    let mut session = open_session(&EngineSettings {
        backend: study.engine.backend,
    })?;

    run_with_session(
        &study,
        &options,
        session.as_mut(),
        &mut progress_cb,
        started,
    )
}

/// Run an already loaded study against a caller-provided session.
///
/// The output path is `options.output`, else the study's path as given.
pub fn run_loaded_study(
    study: &Study,
    options: &RunOptions,
    session: &mut dyn EngineSession,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    run_with_session(study, options, session, &mut progress_cb, Instant::now())
}

fn run_with_session(
    study: &Study,
    options: &RunOptions,
    session: &mut dyn EngineSession,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
) -> AppResult<RunResponse> {
    let plan = study.to_plan()?;
    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| study.output.path.clone());
    let output_mode = options.mode.unwrap_or(study.output.mode);
    let with_manifest = study.output.manifest && !options.no_manifest;

    let started_at = chrono::Utc::now().to_rfc3339();
    let mut sink = create_sink(&output_path, output_mode)?;

    tracing::info!(
        study = %study.name,
        cases = plan.len(),
        output = %output_path.display(),
        mode = %output_mode,
        "Running study"
    );
    emit_progress(
        progress_cb,
        RunStage::Sweeping,
        started,
        Some(format!("Running {} cases", plan.len())),
        None,
    );

    let summary = {
        let mut on_case = |event: SweepProgressEvent| {
            emit_progress(progress_cb, RunStage::Sweeping, started, None, Some(event));
        };
        run_sweep(session, &plan, sink.as_mut(), Some(&mut on_case))?
    };
    drop(sink);

    let mut manifest_path = None;
    let mut manifest = None;
    if with_manifest {
        emit_progress(
            progress_cb,
            RunStage::WritingManifest,
            started,
            Some("Writing run manifest".to_string()),
            None,
        );
        let m = RunManifest {
            study_name: study.name.clone(),
            study_hash: compute_study_hash(study)?,
            backend: session.backend_name().to_string(),
            output_path: output_path.clone(),
            output_mode,
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
        };
        manifest_path = Some(write_manifest(&m)?);
        manifest = Some(m);
    }

    emit_progress(
        progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );

    Ok(RunResponse {
        summary,
        output_path,
        output_mode,
        manifest_path,
        manifest,
    })
}
