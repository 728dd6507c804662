//! Integration tests for sweep completeness and failure isolation.

use sf_engine::LoopbackEngine;
use sf_engine::testing::{Fault, FaultPoint, RecordingEngine};
use sf_sweep::case::{self, CONVERSION, DISTILLATE_PURITY_LIGHT};
use sf_sweep::*;

const PR: &str = "Peng-Robinson (PR)";

fn plan(sweeps: Vec<SweepSpec>) -> SweepPlan {
    SweepPlan {
        sweeps,
        templates: CaseTemplates::default(),
        property_package: PR.to_string(),
    }
}

fn pfr_sweep(volumes: Vec<f64>, temperatures: Vec<f64>) -> SweepSpec {
    let grid = ParameterGrid::new(vec![
        GridAxis::new(case::VOLUME_M3, volumes),
        GridAxis::new(case::TEMPERATURE_C, temperatures),
    ])
    .unwrap();
    SweepSpec::new(CaseKind::Pfr, grid).with_fixed(case::PRESSURE_BAR, 1.0)
}

fn column_sweep(stages: Vec<f64>, reflux: Vec<f64>) -> SweepSpec {
    let grid = ParameterGrid::new(vec![
        GridAxis::new(case::N_STAGES, stages),
        GridAxis::new(case::REFLUX_RATIO, reflux),
    ])
    .unwrap();
    SweepSpec::new(CaseKind::Column, grid)
}

#[test]
fn two_by_two_reactor_grid_gives_four_rows() {
    let plan = plan(vec![pfr_sweep(vec![0.5, 1.0], vec![80.0, 100.0])]);
    let mut engine = LoopbackEngine::new();
    let mut results = ResultCollection::new();

    let summary = run_sweep(&mut engine, &plan, &mut results, None).unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.kind() == CaseKind::Pfr && r.success()));
}

#[test]
fn unregistered_compound_fails_cases_but_sweep_continues() {
    let mut plan = plan(vec![
        pfr_sweep(vec![1.0], vec![100.0]),
        column_sweep(vec![8.0, 10.0], vec![2.0]),
    ]);
    plan.templates.pfr.compounds = vec!["Ethane".to_string(), "Kryptonite".to_string()];

    let mut engine = RecordingEngine::new();
    let mut results = ResultCollection::new();
    let summary = run_sweep(&mut engine, &plan, &mut results, None).unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 2);

    let first = results.as_slice()[0].failure().unwrap();
    assert_eq!(first.stage, FailureStage::Build);
    assert!(first.message.contains("Kryptonite"));
    assert_eq!(engine.stats().leaked(), 0);
}

#[test]
fn injected_faults_never_leak_flowsheets() {
    let points = [
        FaultPoint::OpenFlowsheet,
        FaultPoint::AddCompound,
        FaultPoint::SetProperty,
        FaultPoint::Solve,
        FaultPoint::GetProperty,
        FaultPoint::Close,
    ];
    let plan = plan(vec![
        pfr_sweep(vec![0.5, 1.0], vec![80.0]),
        column_sweep(vec![8.0, 10.0], vec![2.0]),
    ]);

    for point in points {
        // Fault the second reactor case and the first column case.
        let mut engine = RecordingEngine::new()
            .with_fault(Fault::new(point, 2, "injected"))
            .with_fault(Fault::new(point, 3, "injected"));
        let mut results = ResultCollection::new();

        let summary = run_sweep(&mut engine, &plan, &mut results, None).unwrap();
        let stats = engine.stats();

        assert_eq!(summary.total, 4, "fault at {:?}", point);
        assert_eq!(results.len(), 4);
        assert_eq!(stats.attempts, 4);
        assert_eq!(stats.opened, stats.closed, "fault at {:?}", point);
        if point == FaultPoint::Close {
            assert_eq!(summary.failed, 0);
        } else {
            assert_eq!(summary.failed, 2, "fault at {:?}", point);
        }
    }
}

#[test]
fn failed_records_keep_every_output_key() {
    let mut plan = plan(vec![pfr_sweep(vec![1.0], vec![100.0])]);
    plan.templates.pfr.compounds = vec!["Ethane".to_string(), "Kryptonite".to_string()];

    let mut engine = LoopbackEngine::new();
    let mut results = ResultCollection::new();
    run_sweep(&mut engine, &plan, &mut results, None).unwrap();

    let fields = results.as_slice()[0].fields();
    let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    for output in CaseKind::Pfr.output_fields() {
        assert!(names.contains(output), "missing {}", output);
    }
    assert!(
        fields
            .iter()
            .any(|(name, value)| *name == CONVERSION && *value == FieldValue::Empty)
    );
}

#[test]
fn mixed_plan_schema_covers_both_kinds() {
    let plan = plan(vec![
        pfr_sweep(vec![1.0], vec![100.0]),
        column_sweep(vec![10.0], vec![2.0]),
    ]);
    let schema = plan.schema();
    assert!(schema.contains(&CONVERSION));
    assert!(schema.contains(&DISTILLATE_PURITY_LIGHT));
    assert_eq!(plan.points().len(), 2);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn record_count_matches_grid_size(
            m in 1usize..4,
            n in 1usize..4,
            failing in proptest::collection::vec(any::<bool>(), 9),
        ) {
            let volumes: Vec<f64> = (0..m).map(|i| 0.5 + i as f64).collect();
            let temperatures: Vec<f64> = (0..n).map(|i| 80.0 + 10.0 * i as f64).collect();
            let plan = plan(vec![pfr_sweep(volumes, temperatures)]);

            let mut engine = RecordingEngine::new();
            for (ordinal, fail) in failing.iter().enumerate() {
                if *fail {
                    engine = engine.with_fault(Fault::new(FaultPoint::Solve, ordinal + 1, "no convergence"));
                }
            }

            let mut results = ResultCollection::new();
            let summary = run_sweep(&mut engine, &plan, &mut results, None).unwrap();

            prop_assert_eq!(results.len(), m * n);
            prop_assert_eq!(summary.succeeded + summary.failed, m * n);
            prop_assert_eq!(engine.stats().leaked(), 0);
        }
    }
}
