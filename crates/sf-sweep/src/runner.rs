//! Case runner.
//!
//! Runs one case against an engine session and always returns a
//! [`CaseResult`]. Engine errors never leave this module; they become the
//! failure record of the case.

use std::fmt;

use sf_core::units::{bar_of, celsius_of, k, kilowatt_of, pa, watts};
use sf_engine::{EngineError, EngineResult, EngineSession, Flowsheet, ObjectRef, Property};

use crate::builder::{BuiltCase, build_case};
use crate::case::{CaseParams, CaseTemplates};
use crate::result::{
    CaseFailure, CaseOutcome, CaseOutputs, CaseResult, ColumnOutputs, FailureStage, PfrOutputs,
};

/// Lifecycle of a single case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Built,
    Solving,
    Succeeded,
    Failed,
    Closed,
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Built => "built",
            Self::Solving => "solving",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Closes the flowsheet exactly once, on whichever path leaves the case.
struct FlowsheetGuard {
    case: usize,
    sheet: Option<Box<dyn Flowsheet>>,
}

impl FlowsheetGuard {
    fn new(case: usize, sheet: Box<dyn Flowsheet>) -> Self {
        Self {
            case,
            sheet: Some(sheet),
        }
    }

    fn release(&mut self) {
        let Some(sheet) = self.sheet.take() else {
            return;
        };
        if let Err(e) = sheet.close() {
            tracing::warn!(case = self.case, error = %e, "Failed to close flowsheet");
        }
        tracing::debug!(case = self.case, state = %CaseState::Closed, "Case state");
    }
}

impl Drop for FlowsheetGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Run one case: open a flowsheet, build, solve, extract, close.
pub fn run_case(
    session: &mut dyn EngineSession,
    index: usize,
    params: &CaseParams,
    templates: &CaseTemplates,
    property_package: &str,
) -> CaseResult {
    let outcome = match execute(session, index, params, templates, property_package) {
        Ok(outputs) => {
            tracing::debug!(case = index, state = %CaseState::Succeeded, "Case state");
            tracing::info!(case = index, kind = %params.kind(), "{}", outputs.headline());
            CaseOutcome::Succeeded(outputs)
        }
        Err(failure) => {
            tracing::debug!(case = index, state = %CaseState::Failed, "Case state");
            tracing::warn!(
                case = index,
                kind = %params.kind(),
                stage = %failure.stage,
                error = %failure.message,
                "Case failed"
            );
            CaseOutcome::Failed(failure)
        }
    };

    CaseResult {
        index,
        params: *params,
        outcome,
    }
}

fn execute(
    session: &mut dyn EngineSession,
    index: usize,
    params: &CaseParams,
    templates: &CaseTemplates,
    property_package: &str,
) -> Result<CaseOutputs, CaseFailure> {
    let sheet = session
        .open_flowsheet()
        .map_err(|e| CaseFailure::new(FailureStage::Open, &e))?;
    let mut guard = FlowsheetGuard::new(index, sheet);

    let result = match guard.sheet.as_deref_mut() {
        Some(sheet) => solve_case(sheet, index, params, templates, property_package),
        None => Err(CaseFailure::new(
            FailureStage::Open,
            &"flowsheet was released before use",
        )),
    };

    guard.release();
    result
}

fn solve_case(
    sheet: &mut dyn Flowsheet,
    index: usize,
    params: &CaseParams,
    templates: &CaseTemplates,
    property_package: &str,
) -> Result<CaseOutputs, CaseFailure> {
    let built = build_case(sheet, params, templates, property_package)
        .map_err(|e| CaseFailure::new(FailureStage::Build, &e))?;
    tracing::debug!(case = index, state = %CaseState::Built, "Case state");

    tracing::debug!(case = index, state = %CaseState::Solving, "Case state");
    sheet
        .solve()
        .map_err(|e| CaseFailure::new(FailureStage::Solve, &e))?;

    extract(sheet, &built).map_err(|e| CaseFailure::new(FailureStage::Extract, &e))
}

fn extract(sheet: &dyn Flowsheet, built: &BuiltCase) -> EngineResult<CaseOutputs> {
    match built {
        BuiltCase::Pfr {
            feed,
            reactor,
            outlet,
            base_index,
            product_index,
        } => {
            let base_in = read_real(sheet, feed, Property::MolarFlow)?
                * component(sheet, feed, *base_index)?;
            let base_out = read_real(sheet, outlet, Property::MolarFlow)?
                * component(sheet, outlet, *base_index)?;
            if base_in <= 0.0 {
                return Err(EngineError::InvalidProperty {
                    tag: feed.tag.clone(),
                    property: Property::MolarFlow.to_string(),
                    reason: "base reactant is absent from the feed".to_string(),
                });
            }

            let outputs = PfrOutputs {
                conversion: (base_in - base_out) / base_in,
                outlet_b_flow_mol_s: read_real(sheet, outlet, Property::MolarFlow)?
                    * component(sheet, outlet, *product_index)?,
                outlet_temperature_c: celsius_of(k(read_real(
                    sheet,
                    outlet,
                    Property::Temperature,
                )?)),
                heat_duty_kw: kilowatt_of(watts(read_real(sheet, reactor, Property::HeatDuty)?)),
                outlet_pressure_bar: bar_of(pa(read_real(sheet, outlet, Property::Pressure)?)),
            };
            check_finite(
                reactor,
                &[
                    ("conversion", outputs.conversion),
                    ("outlet B flow", outputs.outlet_b_flow_mol_s),
                    ("outlet temperature", outputs.outlet_temperature_c),
                    ("heat duty", outputs.heat_duty_kw),
                    ("outlet pressure", outputs.outlet_pressure_bar),
                ],
            )?;
            Ok(CaseOutputs::Pfr(outputs))
        }
        BuiltCase::Column {
            column,
            distillate,
            bottoms,
            ..
        } => {
            let outputs = ColumnOutputs {
                distillate_purity_light: component(sheet, distillate, 0)?,
                bottoms_purity_heavy: component(sheet, bottoms, 1)?,
                condenser_duty_kw: kilowatt_of(watts(read_real(
                    sheet,
                    column,
                    Property::CondenserDuty,
                )?))
                .abs(),
                reboiler_duty_kw: kilowatt_of(watts(read_real(
                    sheet,
                    column,
                    Property::ReboilerDuty,
                )?))
                .abs(),
                condenser_temp_c: celsius_of(k(read_real(
                    sheet,
                    column,
                    Property::CondenserTemperature,
                )?)),
            };
            check_finite(
                column,
                &[
                    ("distillate purity", outputs.distillate_purity_light),
                    ("bottoms purity", outputs.bottoms_purity_heavy),
                    ("condenser duty", outputs.condenser_duty_kw),
                    ("reboiler duty", outputs.reboiler_duty_kw),
                    ("condenser temperature", outputs.condenser_temp_c),
                ],
            )?;
            Ok(CaseOutputs::Column(outputs))
        }
    }
}

fn read_real(sheet: &dyn Flowsheet, object: &ObjectRef, property: Property) -> EngineResult<f64> {
    sheet
        .get_property(object, property)?
        .as_real(&object.tag, property)
}

/// Mole fraction of compound `index` in a stream. A short vector is an error.
fn component(sheet: &dyn Flowsheet, stream: &ObjectRef, index: usize) -> EngineResult<f64> {
    let value = sheet.get_property(stream, Property::MoleFractions)?;
    let fractions = value.as_vector(&stream.tag, Property::MoleFractions)?;
    fractions
        .get(index)
        .copied()
        .ok_or_else(|| EngineError::InvalidProperty {
            tag: stream.tag.clone(),
            property: Property::MoleFractions.to_string(),
            reason: format!(
                "no entry for compound {} in {} fractions",
                index,
                fractions.len()
            ),
        })
}

fn check_finite(object: &ObjectRef, values: &[(&str, f64)]) -> EngineResult<()> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(EngineError::InvalidProperty {
            tag: object.tag.clone(),
            property: name.to_string(),
            reason: format!("result {} is not finite", v),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ColumnParams, PfrParams};
    use sf_engine::LoopbackEngine;
    use sf_engine::testing::{Fault, FaultPoint, RecordingEngine};

    const PR: &str = "Peng-Robinson (PR)";

    fn pfr() -> CaseParams {
        CaseParams::Pfr(PfrParams::default())
    }

    #[test]
    fn pfr_conversion_comes_from_stream_results() {
        let mut engine = LoopbackEngine::new();
        let result = run_case(&mut engine, 0, &pfr(), &CaseTemplates::default(), PR);

        let Some(CaseOutputs::Pfr(out)) = result.outputs() else {
            panic!("case failed: {:?}", result.failure());
        };
        assert!((out.conversion - 0.5).abs() < 1e-9);
        assert!((out.outlet_temperature_c - 100.0).abs() < 1e-9);
        assert!((out.outlet_pressure_bar - 1.0).abs() < 1e-9);
        assert!(out.outlet_b_flow_mol_s > 0.0);
        assert_eq!(out.heat_duty_kw, 0.0);
    }

    #[test]
    fn template_conversion_drives_the_result() {
        let mut engine = LoopbackEngine::new();
        let mut templates = CaseTemplates::default();
        templates.pfr.conversion = 0.8;

        let result = run_case(&mut engine, 0, &pfr(), &templates, PR);
        let Some(CaseOutputs::Pfr(out)) = result.outputs() else {
            panic!("case failed: {:?}", result.failure());
        };
        assert!((out.conversion - 0.8).abs() < 1e-9);
    }

    #[test]
    fn column_purities_and_duties() {
        let mut engine = LoopbackEngine::new();
        let result = run_case(
            &mut engine,
            0,
            &CaseParams::Column(ColumnParams::default()),
            &CaseTemplates::default(),
            PR,
        );

        let Some(CaseOutputs::Column(out)) = result.outputs() else {
            panic!("case failed: {:?}", result.failure());
        };
        // 50 kmol/h overhead from a 50/50 100 kmol/h feed is a sharp split.
        assert!((out.distillate_purity_light - 1.0).abs() < 1e-9);
        assert!((out.bottoms_purity_heavy - 1.0).abs() < 1e-9);
        assert!(out.condenser_duty_kw > 0.0);
        assert!((out.condenser_duty_kw - out.reboiler_duty_kw).abs() < 1e-9);
        assert!((out.condenser_temp_c - (353.24 - 273.15)).abs() < 1e-6);
    }

    #[test]
    fn feed_stage_beyond_column_fails_at_solve() {
        let mut engine = LoopbackEngine::new();
        let params = CaseParams::Column(ColumnParams {
            n_stages: 5,
            feed_stage: 8,
            ..ColumnParams::default()
        });
        let result = run_case(&mut engine, 3, &params, &CaseTemplates::default(), PR);

        let failure = result.failure().unwrap();
        assert_eq!(failure.stage, FailureStage::Solve);
        assert!(failure.message.contains("feed stage 8"));
        assert_eq!(result.index, 3);
    }

    #[test]
    fn unknown_package_fails_at_build() {
        let mut engine = LoopbackEngine::new();
        let result = run_case(&mut engine, 0, &pfr(), &CaseTemplates::default(), "Magic EOS");
        assert_eq!(result.failure().unwrap().stage, FailureStage::Build);
    }

    #[test]
    fn every_stage_failure_closes_once() {
        let cases = [
            (FaultPoint::OpenFlowsheet, FailureStage::Open, 0),
            (FaultPoint::AddCompound, FailureStage::Build, 1),
            (FaultPoint::SetProperty, FailureStage::Build, 1),
            (FaultPoint::Solve, FailureStage::Solve, 1),
            (FaultPoint::GetProperty, FailureStage::Extract, 1),
        ];

        for (point, stage, opened) in cases {
            let mut engine = RecordingEngine::new().with_fault(Fault::new(point, 1, "injected"));
            let result = run_case(&mut engine, 0, &pfr(), &CaseTemplates::default(), PR);

            let failure = result.failure().unwrap();
            assert_eq!(failure.stage, stage, "fault at {:?}", point);
            assert!(failure.message.contains("injected"));

            let stats = engine.stats();
            assert_eq!(stats.opened, opened);
            assert_eq!(stats.closed, opened);
        }
    }

    #[test]
    fn close_error_does_not_change_outcome() {
        let mut engine =
            RecordingEngine::new().with_fault(Fault::new(FaultPoint::Close, 1, "close failed"));
        let result = run_case(&mut engine, 0, &pfr(), &CaseTemplates::default(), PR);

        assert!(result.success());
        assert_eq!(engine.stats().closed, 1);
    }

    #[test]
    fn long_engine_errors_are_truncated() {
        let long = "x".repeat(500);
        let mut engine = RecordingEngine::new().with_fault(Fault::new(FaultPoint::Solve, 1, long));
        let result = run_case(&mut engine, 0, &pfr(), &CaseTemplates::default(), PR);

        let message = &result.failure().unwrap().message;
        assert_eq!(message.chars().count(), crate::result::MAX_ERROR_CHARS);
        assert!(message.ends_with("..."));
    }
}
