//! Case kinds, their parameters, and the templates used to build them.

use std::collections::BTreeMap;
use std::fmt;

use sf_core::as_whole_number;

use crate::error::{SweepError, SweepResult};

// Common result fields
pub const FIELD_CASE_INDEX: &str = "case_index";
pub const FIELD_CASE_TYPE: &str = "case_type";
pub const FIELD_SUCCESS: &str = "success";
pub const FIELD_ERROR: &str = "error";
pub const FIELD_FAILED_STAGE: &str = "failed_stage";

// Reactor parameters
pub const VOLUME_M3: &str = "volume_m3";
pub const TEMPERATURE_C: &str = "temperature_c";
pub const PRESSURE_BAR: &str = "pressure_bar";

// Column parameters
pub const N_STAGES: &str = "n_stages";
pub const FEED_STAGE: &str = "feed_stage";
pub const REFLUX_RATIO: &str = "reflux_ratio";
pub const DISTILLATE_RATE_KMOL_H: &str = "distillate_rate_kmol_h";

// Reactor outputs
pub const CONVERSION: &str = "conversion";
pub const OUTLET_B_FLOW_MOL_S: &str = "outlet_b_flow_mol_s";
pub const OUTLET_TEMPERATURE_C: &str = "outlet_temperature_c";
pub const HEAT_DUTY_KW: &str = "heat_duty_kw";
pub const OUTLET_PRESSURE_BAR: &str = "outlet_pressure_bar";

// Column outputs
pub const DISTILLATE_PURITY_LIGHT: &str = "distillate_purity_light";
pub const BOTTOMS_PURITY_HEAVY: &str = "bottoms_purity_heavy";
pub const CONDENSER_DUTY_KW: &str = "condenser_duty_kw";
pub const REBOILER_DUTY_KW: &str = "reboiler_duty_kw";
pub const CONDENSER_TEMP_C: &str = "condenser_temp_c";

const COMMON_FIELDS: [&str; 5] = [
    FIELD_CASE_INDEX,
    FIELD_CASE_TYPE,
    FIELD_SUCCESS,
    FIELD_ERROR,
    FIELD_FAILED_STAGE,
];

/// Type of unit operation a case is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaseKind {
    Pfr,
    Column,
}

impl CaseKind {
    pub const ALL: [CaseKind; 2] = [CaseKind::Pfr, CaseKind::Column];

    /// Value written to the `case_type` column.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Pfr => "PFR",
            Self::Column => "Column",
        }
    }

    /// Parameters that may be swept or fixed for this kind.
    pub fn input_fields(self) -> &'static [&'static str] {
        match self {
            Self::Pfr => &[VOLUME_M3, TEMPERATURE_C, PRESSURE_BAR],
            Self::Column => &[N_STAGES, FEED_STAGE, REFLUX_RATIO, DISTILLATE_RATE_KMOL_H],
        }
    }

    pub fn output_fields(self) -> &'static [&'static str] {
        match self {
            Self::Pfr => &[
                CONVERSION,
                OUTLET_B_FLOW_MOL_S,
                OUTLET_TEMPERATURE_C,
                HEAT_DUTY_KW,
                OUTLET_PRESSURE_BAR,
            ],
            Self::Column => &[
                DISTILLATE_PURITY_LIGHT,
                BOTTOMS_PURITY_HEAVY,
                CONDENSER_DUTY_KW,
                REBOILER_DUTY_KW,
                CONDENSER_TEMP_C,
            ],
        }
    }

    /// Every field a result of this kind carries.
    pub fn schema(self) -> Vec<&'static str> {
        COMMON_FIELDS
            .iter()
            .chain(self.input_fields())
            .chain(self.output_fields())
            .copied()
            .collect()
    }

    pub fn accepts_parameter(self, name: &str) -> bool {
        self.input_fields().contains(&name)
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Reactor operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PfrParams {
    pub volume_m3: f64,
    pub temperature_c: f64,
    pub pressure_bar: f64,
}

impl Default for PfrParams {
    fn default() -> Self {
        Self {
            volume_m3: 1.0,
            temperature_c: 100.0,
            pressure_bar: 1.0,
        }
    }
}

/// Column operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnParams {
    pub n_stages: u32,
    /// 1-based stage the feed enters on.
    pub feed_stage: u32,
    pub reflux_ratio: f64,
    pub distillate_rate_kmol_h: f64,
}

impl ColumnParams {
    /// Middle stage, at least stage 3, capped at the last stage.
    pub fn default_feed_stage(n_stages: u32) -> u32 {
        (n_stages / 2).max(3).min(n_stages)
    }
}

impl Default for ColumnParams {
    fn default() -> Self {
        Self {
            n_stages: 10,
            feed_stage: Self::default_feed_stage(10),
            reflux_ratio: 2.0,
            distillate_rate_kmol_h: 50.0,
        }
    }
}

/// Parameters of one case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaseParams {
    Pfr(PfrParams),
    Column(ColumnParams),
}

impl CaseParams {
    pub fn kind(&self) -> CaseKind {
        match self {
            Self::Pfr(_) => CaseKind::Pfr,
            Self::Column(_) => CaseKind::Column,
        }
    }

    /// Resolve a grid point into case parameters.
    ///
    /// Each parameter comes from the grid point, then `fixed`, then the
    /// built-in default.
    pub fn from_point(
        kind: CaseKind,
        point: &[(String, f64)],
        fixed: &BTreeMap<String, f64>,
    ) -> SweepResult<Self> {
        for name in point.iter().map(|(n, _)| n).chain(fixed.keys()) {
            if !kind.accepts_parameter(name) {
                return Err(SweepError::UnknownParameter {
                    name: name.clone(),
                    kind: kind.to_string(),
                });
            }
        }

        let lookup = |name: &str| -> Option<f64> {
            point
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| *v)
                .or_else(|| fixed.get(name).copied())
        };

        match kind {
            CaseKind::Pfr => {
                let defaults = PfrParams::default();
                let params = PfrParams {
                    volume_m3: lookup(VOLUME_M3).unwrap_or(defaults.volume_m3),
                    temperature_c: lookup(TEMPERATURE_C).unwrap_or(defaults.temperature_c),
                    pressure_bar: lookup(PRESSURE_BAR).unwrap_or(defaults.pressure_bar),
                };
                for (name, v) in [
                    (VOLUME_M3, params.volume_m3),
                    (TEMPERATURE_C, params.temperature_c),
                    (PRESSURE_BAR, params.pressure_bar),
                ] {
                    ensure_finite(name, v)?;
                }
                Ok(Self::Pfr(params))
            }
            CaseKind::Column => {
                let defaults = ColumnParams::default();
                let n_stages = match lookup(N_STAGES) {
                    Some(v) => whole(N_STAGES, v)?,
                    None => defaults.n_stages,
                };
                if n_stages < 2 {
                    return Err(SweepError::InvalidParameter {
                        name: N_STAGES.to_string(),
                        reason: format!("a column needs at least 2 stages, got {}", n_stages),
                    });
                }
                let feed_stage = match lookup(FEED_STAGE) {
                    Some(v) => whole(FEED_STAGE, v)?,
                    None => ColumnParams::default_feed_stage(n_stages),
                };
                if feed_stage < 1 {
                    return Err(SweepError::InvalidParameter {
                        name: FEED_STAGE.to_string(),
                        reason: "stages are numbered from 1".to_string(),
                    });
                }
                let params = ColumnParams {
                    n_stages,
                    feed_stage,
                    reflux_ratio: lookup(REFLUX_RATIO).unwrap_or(defaults.reflux_ratio),
                    distillate_rate_kmol_h: lookup(DISTILLATE_RATE_KMOL_H)
                        .unwrap_or(defaults.distillate_rate_kmol_h),
                };
                ensure_finite(REFLUX_RATIO, params.reflux_ratio)?;
                ensure_finite(DISTILLATE_RATE_KMOL_H, params.distillate_rate_kmol_h)?;
                Ok(Self::Column(params))
            }
        }
    }

    /// Short human-readable description for progress output.
    pub fn label(&self) -> String {
        match self {
            Self::Pfr(p) => format!(
                "Volume={} m³, Temp={}°C, P={} bar",
                p.volume_m3, p.temperature_c, p.pressure_bar
            ),
            Self::Column(c) => format!(
                "Stages={}, Feed stage={}, RR={}, D={} kmol/h",
                c.n_stages, c.feed_stage, c.reflux_ratio, c.distillate_rate_kmol_h
            ),
        }
    }
}

fn ensure_finite(name: &str, v: f64) -> SweepResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(SweepError::InvalidParameter {
            name: name.to_string(),
            reason: format!("value {} is not finite", v),
        })
    }
}

fn whole(name: &'static str, v: f64) -> SweepResult<u32> {
    as_whole_number(v, name).map_err(|e| SweepError::InvalidParameter {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// How reactor cases are set up around the swept parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PfrTemplate {
    pub compounds: Vec<String>,
    pub feed_mole_fractions: Vec<f64>,
    pub feed_mass_flow_kg_h: f64,
    pub base_reactant: String,
    /// Compound reported as `outlet_b_flow_mol_s`.
    pub key_product: String,
    pub stoichiometry: Vec<(String, f64)>,
    /// Fractional conversion of the base reactant.
    pub conversion: f64,
}

impl Default for PfrTemplate {
    fn default() -> Self {
        Self {
            compounds: vec!["Ethane".to_string(), "Propane".to_string()],
            feed_mole_fractions: vec![1.0, 0.0],
            feed_mass_flow_kg_h: 1000.0,
            base_reactant: "Ethane".to_string(),
            key_product: "Propane".to_string(),
            stoichiometry: vec![("Ethane".to_string(), -1.0), ("Propane".to_string(), 1.0)],
            conversion: 0.5,
        }
    }
}

/// How column cases are set up around the swept parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTemplate {
    /// Light key first, heavy key second.
    pub compounds: Vec<String>,
    pub feed_mole_fractions: Vec<f64>,
    pub feed_temperature_c: f64,
    pub feed_pressure_bar: f64,
    pub feed_molar_flow_kmol_h: f64,
}

impl Default for ColumnTemplate {
    fn default() -> Self {
        Self {
            compounds: vec!["Benzene".to_string(), "Toluene".to_string()],
            feed_mole_fractions: vec![0.5, 0.5],
            feed_temperature_c: 90.0,
            feed_pressure_bar: 1.013_25,
            feed_molar_flow_kmol_h: 100.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseTemplates {
    pub pfr: PfrTemplate,
    pub column: ColumnTemplate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn pfr_point_uses_fixed_then_defaults() {
        let mut fixed = BTreeMap::new();
        fixed.insert(PRESSURE_BAR.to_string(), 2.5);

        let params = CaseParams::from_point(
            CaseKind::Pfr,
            &point(&[(VOLUME_M3, 0.5), (TEMPERATURE_C, 80.0)]),
            &fixed,
        )
        .unwrap();

        assert_eq!(
            params,
            CaseParams::Pfr(PfrParams {
                volume_m3: 0.5,
                temperature_c: 80.0,
                pressure_bar: 2.5,
            })
        );
    }

    #[test]
    fn column_feed_stage_defaults_to_middle() {
        let params = CaseParams::from_point(
            CaseKind::Column,
            &point(&[(N_STAGES, 20.0), (REFLUX_RATIO, 3.0)]),
            &BTreeMap::new(),
        )
        .unwrap();
        let CaseParams::Column(c) = params else {
            panic!("expected column params");
        };
        assert_eq!(c.n_stages, 20);
        assert_eq!(c.feed_stage, 10);
        assert_eq!(c.distillate_rate_kmol_h, 50.0);

        assert_eq!(ColumnParams::default_feed_stage(4), 3);
        assert_eq!(ColumnParams::default_feed_stage(2), 2);
    }

    #[test]
    fn reject_foreign_and_fractional_parameters() {
        let err = CaseParams::from_point(
            CaseKind::Pfr,
            &point(&[(REFLUX_RATIO, 2.0)]),
            &BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SweepError::UnknownParameter { .. }));

        let err = CaseParams::from_point(
            CaseKind::Column,
            &point(&[(N_STAGES, 7.5)]),
            &BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SweepError::InvalidParameter { .. }));

        assert!(
            CaseParams::from_point(CaseKind::Column, &point(&[(N_STAGES, 1.0)]), &BTreeMap::new())
                .is_err()
        );
    }

    #[test]
    fn schema_has_common_inputs_and_outputs() {
        let schema = CaseKind::Pfr.schema();
        assert!(schema.contains(&FIELD_CASE_TYPE));
        assert!(schema.contains(&VOLUME_M3));
        assert!(schema.contains(&CONVERSION));
        assert!(!schema.contains(&REFLUX_RATIO));
        assert_eq!(CaseKind::Column.schema().len(), 5 + 4 + 5);
    }
}
