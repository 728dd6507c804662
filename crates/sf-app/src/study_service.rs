//! Study loading, saving, validation, and introspection.

use std::path::Path;

use sf_study::Study;
use sf_sweep::CaseKind;

use crate::error::{AppError, AppResult};

/// Summary of one sweep for listing.
#[derive(Debug, Clone)]
pub struct SweepOverview {
    pub kind: CaseKind,
    /// Axis names with their value counts, in nesting order.
    pub axes: Vec<(String, usize)>,
    pub fixed: Vec<(String, f64)>,
    pub cases: usize,
}

#[derive(Debug, Clone)]
pub struct StudySummary {
    pub name: String,
    pub sweeps: Vec<SweepOverview>,
    pub total_cases: usize,
}

/// One case as it will run.
#[derive(Debug, Clone)]
pub struct PlannedCase {
    pub index: usize,
    pub kind: CaseKind,
    pub label: String,
}

/// Load, migrate and validate a study from a YAML file.
pub fn load_study(path: &Path) -> AppResult<Study> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::StudyFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(sf_study::from_yaml_str(&content)?)
}

/// Save study to a YAML file.
pub fn save_study(path: &Path, study: &Study) -> AppResult<()> {
    let content = sf_study::to_yaml_string(study)?;

    std::fs::write(path, content).map_err(|e| AppError::StudyFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Write the default screening study, refusing to overwrite.
pub fn init_study(path: &Path) -> AppResult<Study> {
    if path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            path.display()
        )));
    }
    let study = Study::default();
    save_study(path, &study)?;
    Ok(study)
}

pub fn summarize_study(study: &Study) -> AppResult<StudySummary> {
    let plan = study.to_plan()?;
    let sweeps: Vec<SweepOverview> = plan
        .sweeps
        .iter()
        .map(|s| SweepOverview {
            kind: s.kind,
            axes: s
                .grid
                .axes()
                .iter()
                .map(|a| (a.name.clone(), a.values.len()))
                .collect(),
            fixed: s.fixed.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            cases: s.grid.len(),
        })
        .collect();

    Ok(StudySummary {
        name: study.name.clone(),
        total_cases: plan.len(),
        sweeps,
    })
}

/// Every case in execution order, without running anything.
pub fn plan_cases(study: &Study) -> AppResult<Vec<PlannedCase>> {
    let plan = study.to_plan()?;
    let cases = plan.cases()?;
    Ok(cases
        .iter()
        .enumerate()
        .map(|(index, params)| PlannedCase {
            index,
            kind: params.kind(),
            label: params.label(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_study_summary() {
        let summary = summarize_study(&Study::default()).unwrap();
        assert_eq!(summary.total_cases, 32);
        assert_eq!(summary.sweeps.len(), 2);
        assert_eq!(
            summary.sweeps[0].axes,
            vec![("volume_m3".to_string(), 4), ("temperature_c".to_string(), 4)]
        );
        assert_eq!(summary.sweeps[0].fixed, vec![("pressure_bar".to_string(), 1.0)]);
    }

    #[test]
    fn planned_cases_are_numbered_in_order() {
        let cases = plan_cases(&Study::default()).unwrap();
        assert_eq!(cases.len(), 32);
        assert_eq!(cases[0].kind, CaseKind::Pfr);
        assert_eq!(cases[0].label, "Volume=0.5 m³, Temp=80°C, P=1 bar");
        assert_eq!(cases[31].kind, CaseKind::Column);
        assert!(cases.iter().enumerate().all(|(i, c)| c.index == i));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_study(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, AppError::StudyFileRead { .. }));
    }
}
