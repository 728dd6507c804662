//! Case results and the sink seam.

use std::fmt;

use crate::case::{self, CaseKind, CaseParams};
use crate::error::SinkError;

/// Longest error text kept in a result, in characters.
pub const MAX_ERROR_CHARS: usize = 200;

/// Step of the case lifecycle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The engine could not create a flowsheet.
    Open,
    /// Compound, property package, stream or unit setup was rejected.
    Build,
    /// The engine could not solve the flowsheet.
    Solve,
    /// The solve returned but an expected output was unavailable.
    Extract,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Build => "build",
            Self::Solve => "solve",
            Self::Extract => "extract",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a case failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseFailure {
    pub stage: FailureStage,
    pub message: String,
}

impl CaseFailure {
    pub fn new(stage: FailureStage, error: &impl fmt::Display) -> Self {
        Self {
            stage,
            message: truncate_message(&error.to_string(), MAX_ERROR_CHARS),
        }
    }
}

/// Cut `message` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = message.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Reactor results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PfrOutputs {
    pub conversion: f64,
    pub outlet_b_flow_mol_s: f64,
    pub outlet_temperature_c: f64,
    pub heat_duty_kw: f64,
    pub outlet_pressure_bar: f64,
}

/// Column results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnOutputs {
    pub distillate_purity_light: f64,
    pub bottoms_purity_heavy: f64,
    pub condenser_duty_kw: f64,
    pub reboiler_duty_kw: f64,
    pub condenser_temp_c: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaseOutputs {
    Pfr(PfrOutputs),
    Column(ColumnOutputs),
}

impl CaseOutputs {
    /// One-line headline for progress output.
    pub fn headline(&self) -> String {
        match self {
            Self::Pfr(o) => format!("Conversion: {:.2}%", o.conversion * 100.0),
            Self::Column(o) => format!("Dist Purity: {:.2}%", o.distillate_purity_light * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Succeeded(CaseOutputs),
    Failed(CaseFailure),
}

/// Value of one result field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(u64),
    Real(f64),
    Bool(bool),
    Text(String),
    /// Defined default for outputs of failed cases and absent fields.
    Empty,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Empty => Ok(()),
        }
    }
}

/// Outcome of one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    /// 0-based execution ordinal across the whole sweep.
    pub index: usize,
    pub params: CaseParams,
    pub outcome: CaseOutcome,
}

impl CaseResult {
    pub fn kind(&self) -> CaseKind {
        self.params.kind()
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, CaseOutcome::Succeeded(_))
    }

    pub fn failure(&self) -> Option<&CaseFailure> {
        match &self.outcome {
            CaseOutcome::Failed(f) => Some(f),
            CaseOutcome::Succeeded(_) => None,
        }
    }

    pub fn outputs(&self) -> Option<&CaseOutputs> {
        match &self.outcome {
            CaseOutcome::Succeeded(o) => Some(o),
            CaseOutcome::Failed(_) => None,
        }
    }

    /// All fields of this record, in schema order.
    ///
    /// The field set depends only on the case kind: outputs of a failed case
    /// are present as [`FieldValue::Empty`].
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = vec![
            (case::FIELD_CASE_INDEX, FieldValue::Integer(self.index as u64)),
            (case::FIELD_CASE_TYPE, FieldValue::Text(self.kind().tag().to_string())),
        ];

        match &self.params {
            CaseParams::Pfr(p) => fields.extend([
                (case::VOLUME_M3, FieldValue::Real(p.volume_m3)),
                (case::TEMPERATURE_C, FieldValue::Real(p.temperature_c)),
                (case::PRESSURE_BAR, FieldValue::Real(p.pressure_bar)),
            ]),
            CaseParams::Column(c) => fields.extend([
                (case::N_STAGES, FieldValue::Integer(c.n_stages.into())),
                (case::FEED_STAGE, FieldValue::Integer(c.feed_stage.into())),
                (case::REFLUX_RATIO, FieldValue::Real(c.reflux_ratio)),
                (
                    case::DISTILLATE_RATE_KMOL_H,
                    FieldValue::Real(c.distillate_rate_kmol_h),
                ),
            ]),
        }

        fields.push((case::FIELD_SUCCESS, FieldValue::Bool(self.success())));
        match self.failure() {
            Some(failure) => {
                fields.push((case::FIELD_ERROR, FieldValue::Text(failure.message.clone())));
                fields.push((
                    case::FIELD_FAILED_STAGE,
                    FieldValue::Text(failure.stage.to_string()),
                ));
            }
            None => {
                fields.push((case::FIELD_ERROR, FieldValue::Empty));
                fields.push((case::FIELD_FAILED_STAGE, FieldValue::Empty));
            }
        }

        match self.outputs() {
            Some(CaseOutputs::Pfr(o)) => fields.extend([
                (case::CONVERSION, FieldValue::Real(o.conversion)),
                (case::OUTLET_B_FLOW_MOL_S, FieldValue::Real(o.outlet_b_flow_mol_s)),
                (case::OUTLET_TEMPERATURE_C, FieldValue::Real(o.outlet_temperature_c)),
                (case::HEAT_DUTY_KW, FieldValue::Real(o.heat_duty_kw)),
                (case::OUTLET_PRESSURE_BAR, FieldValue::Real(o.outlet_pressure_bar)),
            ]),
            Some(CaseOutputs::Column(o)) => fields.extend([
                (
                    case::DISTILLATE_PURITY_LIGHT,
                    FieldValue::Real(o.distillate_purity_light),
                ),
                (case::BOTTOMS_PURITY_HEAVY, FieldValue::Real(o.bottoms_purity_heavy)),
                (case::CONDENSER_DUTY_KW, FieldValue::Real(o.condenser_duty_kw)),
                (case::REBOILER_DUTY_KW, FieldValue::Real(o.reboiler_duty_kw)),
                (case::CONDENSER_TEMP_C, FieldValue::Real(o.condenser_temp_c)),
            ]),
            None => fields.extend(
                self.kind()
                    .output_fields()
                    .iter()
                    .map(|name| (*name, FieldValue::Empty)),
            ),
        }

        fields
    }
}

/// Destination for case results as the sweep produces them.
pub trait ResultSink {
    /// Called once before the first case with the sorted union of the schemas
    /// of every case kind in the plan.
    fn begin(&mut self, _schema: &[&'static str]) -> Result<(), SinkError> {
        Ok(())
    }

    fn accept(&mut self, result: &CaseResult) -> Result<(), SinkError>;

    /// Called once after the last case.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Results in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultCollection {
    results: Vec<CaseResult>,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CaseResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[CaseResult] {
        &self.results
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

impl ResultSink for ResultCollection {
    fn accept(&mut self, result: &CaseResult) -> Result<(), SinkError> {
        self.push(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ColumnParams, PfrParams};

    fn failed_pfr() -> CaseResult {
        CaseResult {
            index: 3,
            params: CaseParams::Pfr(PfrParams::default()),
            outcome: CaseOutcome::Failed(CaseFailure::new(
                FailureStage::Build,
                &"Unknown compound: Unobtainium",
            )),
        }
    }

    #[test]
    fn failed_case_keeps_every_field() {
        let failed = failed_pfr();
        let names: Vec<&str> = failed.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), CaseKind::Pfr.schema().len());
        for name in CaseKind::Pfr.schema() {
            assert!(names.contains(&name), "missing {}", name);
        }

        let fields = failed.fields();
        let conversion = fields.iter().find(|(n, _)| *n == case::CONVERSION).unwrap();
        assert_eq!(conversion.1, FieldValue::Empty);
        let stage = fields
            .iter()
            .find(|(n, _)| *n == case::FIELD_FAILED_STAGE)
            .unwrap();
        assert_eq!(stage.1, FieldValue::Text("build".to_string()));
    }

    #[test]
    fn successful_column_fields() {
        let result = CaseResult {
            index: 0,
            params: CaseParams::Column(ColumnParams::default()),
            outcome: CaseOutcome::Succeeded(CaseOutputs::Column(ColumnOutputs {
                distillate_purity_light: 0.99,
                bottoms_purity_heavy: 0.95,
                condenser_duty_kw: 1200.0,
                reboiler_duty_kw: 1250.0,
                condenser_temp_c: 80.1,
            })),
        };
        let fields = result.fields();
        assert_eq!(fields.len(), CaseKind::Column.schema().len());
        assert!(fields.contains(&(case::N_STAGES, FieldValue::Integer(10))));
        assert!(fields.contains(&(case::FIELD_ERROR, FieldValue::Empty)));
        assert_eq!(
            result.outputs().unwrap().headline(),
            "Dist Purity: 99.00%"
        );
    }

    #[test]
    fn long_errors_are_truncated_on_char_boundaries() {
        let long = "é".repeat(500);
        let cut = truncate_message(&long, MAX_ERROR_CHARS);
        assert_eq!(cut.chars().count(), MAX_ERROR_CHARS);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_message("short", MAX_ERROR_CHARS), "short");
    }

    #[test]
    fn collection_counts() {
        let mut results = ResultCollection::new();
        results.accept(&failed_pfr()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.failed(), 1);
        assert_eq!(results.succeeded(), 0);
    }

    #[test]
    fn field_values_render_as_cells() {
        assert_eq!(FieldValue::Real(0.5).to_string(), "0.5");
        assert_eq!(FieldValue::Integer(12).to_string(), "12");
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
        assert_eq!(FieldValue::Empty.to_string(), "");
    }
}
