//! Study validation logic.

use std::collections::HashSet;

use sf_sweep::case::{
    DISTILLATE_RATE_KMOL_H, FEED_STAGE, N_STAGES, PRESSURE_BAR, REFLUX_RATIO, VOLUME_M3,
};
use sf_sweep::CaseKind;

use crate::schema::{AxisDef, ColumnTemplateDef, PfrTemplateDef, Study, SweepDef};

const FRACTION_SUM_TOL: f64 = 1e-6;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Empty {context}")]
    Empty { context: String },

    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Unknown parameter: {name} for {case} cases in {context}")]
    UnknownParameter {
        name: String,
        case: String,
        context: String,
    },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid grid in {context}: {reason}")]
    Grid { context: String, reason: String },
}

fn invalid(
    field: impl Into<String>,
    value: impl ToString,
    reason: impl Into<String>,
) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_study(study: &Study) -> Result<(), ValidationError> {
    if study.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: study.version,
        });
    }
    if study.name.trim().is_empty() {
        return Err(invalid("name", "", "study name cannot be empty"));
    }
    if study.output.path.as_os_str().is_empty() {
        return Err(invalid("output.path", "", "output path cannot be empty"));
    }
    if study.engine.property_package.trim().is_empty() {
        return Err(invalid(
            "engine.property_package",
            "",
            "property package cannot be empty",
        ));
    }

    validate_pfr_template(&study.templates.pfr)?;
    validate_column_template(&study.templates.column)?;

    if study.sweeps.is_empty() {
        return Err(ValidationError::Empty {
            context: "sweeps".to_string(),
        });
    }
    for (i, sweep) in study.sweeps.iter().enumerate() {
        validate_sweep(sweep, &format!("sweeps[{}]", i))?;
    }

    Ok(())
}

fn validate_sweep(sweep: &SweepDef, context: &str) -> Result<(), ValidationError> {
    let kind = CaseKind::from(sweep.case);

    let mut names = HashSet::new();
    for axis in &sweep.grid {
        if !kind.accepts_parameter(&axis.name) {
            return Err(ValidationError::UnknownParameter {
                name: axis.name.clone(),
                case: kind.to_string(),
                context: format!("{}.grid", context),
            });
        }
        if !names.insert(axis.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                name: axis.name.clone(),
                context: format!("{}.grid", context),
            });
        }
        validate_axis(axis, context)?;
    }

    for (name, value) in &sweep.fixed {
        if !kind.accepts_parameter(name) {
            return Err(ValidationError::UnknownParameter {
                name: name.clone(),
                case: kind.to_string(),
                context: format!("{}.fixed", context),
            });
        }
        if names.contains(name.as_str()) {
            return Err(ValidationError::DuplicateName {
                name: name.clone(),
                context: format!("{} grid and fixed", context),
            });
        }
        validate_parameter(name, *value)?;
    }

    Ok(())
}

fn validate_axis(axis: &AxisDef, context: &str) -> Result<(), ValidationError> {
    let field = format!("{}.{}", context, axis.name);
    match (&axis.values, &axis.range) {
        (Some(values), None) => {
            if values.is_empty() {
                return Err(ValidationError::Empty {
                    context: format!("axis {}", field),
                });
            }
            for v in values {
                validate_parameter(&axis.name, *v)?;
            }
        }
        (None, Some(range)) => {
            let spec = crate::plan::range_spec(range);
            spec.validate().map_err(|e| ValidationError::Grid {
                context: field.clone(),
                reason: e.to_string(),
            })?;
            for v in spec.generate_points() {
                validate_parameter(&axis.name, v)?;
            }
        }
        _ => {
            return Err(invalid(
                field,
                "",
                "an axis needs exactly one of `values` or `range`",
            ));
        }
    }
    Ok(())
}

/// Checks that depend on the parameter alone.
fn validate_parameter(name: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid(name, value, "value must be finite"));
    }
    match name {
        N_STAGES | FEED_STAGE if value.fract() != 0.0 => {
            Err(invalid(name, value, "must be a whole number"))
        }
        N_STAGES if value < 2.0 => Err(invalid(name, value, "a column needs at least 2 stages")),
        FEED_STAGE if value < 1.0 => Err(invalid(name, value, "stages are numbered from 1")),
        VOLUME_M3 | PRESSURE_BAR | REFLUX_RATIO | DISTILLATE_RATE_KMOL_H if value <= 0.0 => {
            Err(invalid(name, value, "must be positive"))
        }
        _ => Ok(()),
    }
}

fn validate_fractions(
    context: &str,
    compounds: &[String],
    fractions: &[f64],
) -> Result<(), ValidationError> {
    let field = format!("{}.feed_mole_fractions", context);
    if fractions.len() != compounds.len() {
        return Err(invalid(
            field,
            format!("{:?}", fractions),
            format!("expected {} entries, one per compound", compounds.len()),
        ));
    }
    if fractions.iter().any(|x| !x.is_finite() || !(0.0..=1.0).contains(x)) {
        return Err(invalid(
            field,
            format!("{:?}", fractions),
            "fractions must lie in [0, 1]",
        ));
    }
    let sum: f64 = fractions.iter().sum();
    if (sum - 1.0).abs() > FRACTION_SUM_TOL {
        return Err(invalid(field, sum, "fractions must sum to 1"));
    }
    Ok(())
}

fn validate_compounds(
    context: &str,
    compounds: &[String],
    min: usize,
) -> Result<(), ValidationError> {
    if compounds.len() < min {
        return Err(invalid(
            format!("{}.compounds", context),
            compounds.len(),
            format!("at least {} compounds are required", min),
        ));
    }
    let mut seen = HashSet::new();
    for c in compounds {
        if !seen.insert(c.to_ascii_lowercase()) {
            return Err(ValidationError::DuplicateName {
                name: c.clone(),
                context: format!("{}.compounds", context),
            });
        }
    }
    Ok(())
}

fn contains_compound(compounds: &[String], name: &str) -> bool {
    compounds.iter().any(|c| c.eq_ignore_ascii_case(name))
}

fn validate_pfr_template(t: &PfrTemplateDef) -> Result<(), ValidationError> {
    let ctx = "templates.pfr";
    validate_compounds(ctx, &t.compounds, 1)?;
    validate_fractions(ctx, &t.compounds, &t.feed_mole_fractions)?;

    if !t.feed_mass_flow_kg_h.is_finite() || t.feed_mass_flow_kg_h <= 0.0 {
        return Err(invalid(
            "templates.pfr.feed_mass_flow_kg_h",
            t.feed_mass_flow_kg_h,
            "must be positive",
        ));
    }
    for (field, name) in [("base_reactant", &t.base_reactant), ("key_product", &t.key_product)] {
        if !contains_compound(&t.compounds, name) {
            return Err(invalid(
                format!("{}.{}", ctx, field),
                name,
                "not in the compound list",
            ));
        }
    }
    for s in &t.stoichiometry {
        if !contains_compound(&t.compounds, &s.compound) {
            return Err(invalid(
                format!("{}.stoichiometry", ctx),
                &s.compound,
                "not in the compound list",
            ));
        }
        if !s.coefficient.is_finite() {
            return Err(invalid(
                format!("{}.stoichiometry", ctx),
                s.coefficient,
                "coefficient must be finite",
            ));
        }
    }
    match t
        .stoichiometry
        .iter()
        .find(|s| s.compound.eq_ignore_ascii_case(&t.base_reactant))
    {
        Some(s) if s.coefficient < 0.0 => {}
        _ => {
            return Err(invalid(
                format!("{}.stoichiometry", ctx),
                &t.base_reactant,
                "base reactant must be consumed",
            ));
        }
    }
    if !(0.0..=1.0).contains(&t.conversion) {
        return Err(invalid(
            format!("{}.conversion", ctx),
            t.conversion,
            "conversion must lie in [0, 1]",
        ));
    }
    Ok(())
}

fn validate_column_template(t: &ColumnTemplateDef) -> Result<(), ValidationError> {
    let ctx = "templates.column";
    // Purities read the light key at 0 and the heavy key at 1.
    validate_compounds(ctx, &t.compounds, 2)?;
    validate_fractions(ctx, &t.compounds, &t.feed_mole_fractions)?;

    if !t.feed_temperature_c.is_finite() || t.feed_temperature_c <= -273.15 {
        return Err(invalid(
            format!("{}.feed_temperature_c", ctx),
            t.feed_temperature_c,
            "must be above absolute zero",
        ));
    }
    for (field, value) in [
        ("feed_pressure_bar", t.feed_pressure_bar),
        ("feed_molar_flow_kmol_h", t.feed_molar_flow_kmol_h),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(format!("{}.{}", ctx, field), value, "must be positive"));
        }
    }
    Ok(())
}
