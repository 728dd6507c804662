//! Conversion from the study file into a runnable sweep plan.

use sf_sweep::{
    CaseKind, CaseTemplates, GridAxis, ParameterGrid, RangeSpec, Spacing, SweepPlan, SweepSpec,
};

use crate::schema::{AxisDef, CaseKindDef, RangeDef, SpacingDef, Study};
use crate::validate::ValidationError;

impl From<CaseKindDef> for CaseKind {
    fn from(kind: CaseKindDef) -> Self {
        match kind {
            CaseKindDef::Pfr => CaseKind::Pfr,
            CaseKindDef::Column => CaseKind::Column,
        }
    }
}

pub(crate) fn range_spec(range: &RangeDef) -> RangeSpec {
    RangeSpec {
        start: range.start,
        end: range.end,
        points: range.points,
        spacing: match range.spacing {
            SpacingDef::Linear => Spacing::Linear,
            SpacingDef::Logarithmic => Spacing::Logarithmic,
        },
    }
}

fn grid_axis(axis: &AxisDef, context: &str) -> Result<GridAxis, ValidationError> {
    let grid_error = |reason: String| ValidationError::Grid {
        context: format!("{}.{}", context, axis.name),
        reason,
    };
    match (&axis.values, &axis.range) {
        (Some(values), None) => Ok(GridAxis::new(axis.name.clone(), values.clone())),
        (None, Some(range)) => GridAxis::from_range(axis.name.clone(), &range_spec(range))
            .map_err(|e| grid_error(e.to_string())),
        _ => Err(grid_error(
            "an axis needs exactly one of `values` or `range`".to_string(),
        )),
    }
}

/// Build the sweep plan described by `study` without validating it.
pub fn build_plan(study: &Study) -> Result<SweepPlan, ValidationError> {
    let mut sweeps = Vec::with_capacity(study.sweeps.len());
    for (i, sweep) in study.sweeps.iter().enumerate() {
        let context = format!("sweeps[{}]", i);
        let axes = sweep
            .grid
            .iter()
            .map(|axis| grid_axis(axis, &context))
            .collect::<Result<Vec<_>, _>>()?;
        let grid = ParameterGrid::new(axes).map_err(|e| ValidationError::Grid {
            context: context.clone(),
            reason: e.to_string(),
        })?;

        sweeps.push(SweepSpec {
            kind: sweep.case.into(),
            grid,
            fixed: sweep.fixed.clone(),
        });
    }

    Ok(SweepPlan {
        sweeps,
        templates: CaseTemplates {
            pfr: (&study.templates.pfr).into(),
            column: (&study.templates.column).into(),
        },
        property_package: study.engine.property_package.clone(),
    })
}
