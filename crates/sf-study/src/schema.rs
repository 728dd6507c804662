//! Study file schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sf_engine::BackendKind;
use sf_sweep::{ColumnTemplate, PfrTemplate};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Study {
    #[serde(default)]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub engine: EngineDef,
    #[serde(default)]
    pub output: OutputDef,
    #[serde(default)]
    pub templates: TemplatesDef,
    #[serde(default)]
    pub sweeps: Vec<SweepDef>,
}

impl Default for Study {
    /// The reactor and column screening sweep: 16 cases of each.
    fn default() -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            name: "screening".to_string(),
            engine: EngineDef::default(),
            output: OutputDef::default(),
            templates: TemplatesDef::default(),
            sweeps: vec![
                SweepDef {
                    case: CaseKindDef::Pfr,
                    grid: vec![
                        AxisDef::values("volume_m3", vec![0.5, 1.0, 2.0, 5.0]),
                        AxisDef::values("temperature_c", vec![80.0, 100.0, 120.0, 150.0]),
                    ],
                    fixed: BTreeMap::from([("pressure_bar".to_string(), 1.0)]),
                },
                SweepDef {
                    case: CaseKindDef::Column,
                    grid: vec![
                        AxisDef::values("n_stages", vec![8.0, 10.0, 15.0, 20.0]),
                        AxisDef::values("reflux_ratio", vec![1.5, 2.0, 3.0, 4.0]),
                    ],
                    fixed: BTreeMap::new(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineDef {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_property_package")]
    pub property_package: String,
}

fn default_property_package() -> String {
    "Peng-Robinson (PR)".to_string()
}

impl Default for EngineDef {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            property_package: default_property_package(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Header at start, one flushed row per case.
    #[default]
    Streaming,
    /// All rows written after the sweep.
    Buffered,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => write!(f, "streaming"),
            Self::Buffered => write!(f, "buffered"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDef {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub mode: OutputMode,
    #[serde(default = "default_true")]
    pub manifest: bool,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("results.csv")
}

fn default_true() -> bool {
    true
}

impl Default for OutputDef {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            mode: OutputMode::default(),
            manifest: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TemplatesDef {
    #[serde(default)]
    pub pfr: PfrTemplateDef,
    #[serde(default)]
    pub column: ColumnTemplateDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoichiometryDef {
    pub compound: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PfrTemplateDef {
    pub compounds: Vec<String>,
    pub feed_mole_fractions: Vec<f64>,
    pub feed_mass_flow_kg_h: f64,
    pub base_reactant: String,
    pub key_product: String,
    pub stoichiometry: Vec<StoichiometryDef>,
    pub conversion: f64,
}

impl Default for PfrTemplateDef {
    fn default() -> Self {
        PfrTemplateDef::from(&PfrTemplate::default())
    }
}

impl From<&PfrTemplate> for PfrTemplateDef {
    fn from(t: &PfrTemplate) -> Self {
        Self {
            compounds: t.compounds.clone(),
            feed_mole_fractions: t.feed_mole_fractions.clone(),
            feed_mass_flow_kg_h: t.feed_mass_flow_kg_h,
            base_reactant: t.base_reactant.clone(),
            key_product: t.key_product.clone(),
            stoichiometry: t
                .stoichiometry
                .iter()
                .map(|(compound, coefficient)| StoichiometryDef {
                    compound: compound.clone(),
                    coefficient: *coefficient,
                })
                .collect(),
            conversion: t.conversion,
        }
    }
}

impl From<&PfrTemplateDef> for PfrTemplate {
    fn from(d: &PfrTemplateDef) -> Self {
        Self {
            compounds: d.compounds.clone(),
            feed_mole_fractions: d.feed_mole_fractions.clone(),
            feed_mass_flow_kg_h: d.feed_mass_flow_kg_h,
            base_reactant: d.base_reactant.clone(),
            key_product: d.key_product.clone(),
            stoichiometry: d
                .stoichiometry
                .iter()
                .map(|s| (s.compound.clone(), s.coefficient))
                .collect(),
            conversion: d.conversion,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnTemplateDef {
    pub compounds: Vec<String>,
    pub feed_mole_fractions: Vec<f64>,
    pub feed_temperature_c: f64,
    pub feed_pressure_bar: f64,
    pub feed_molar_flow_kmol_h: f64,
}

impl Default for ColumnTemplateDef {
    fn default() -> Self {
        ColumnTemplateDef::from(&ColumnTemplate::default())
    }
}

impl From<&ColumnTemplate> for ColumnTemplateDef {
    fn from(t: &ColumnTemplate) -> Self {
        Self {
            compounds: t.compounds.clone(),
            feed_mole_fractions: t.feed_mole_fractions.clone(),
            feed_temperature_c: t.feed_temperature_c,
            feed_pressure_bar: t.feed_pressure_bar,
            feed_molar_flow_kmol_h: t.feed_molar_flow_kmol_h,
        }
    }
}

impl From<&ColumnTemplateDef> for ColumnTemplate {
    fn from(d: &ColumnTemplateDef) -> Self {
        Self {
            compounds: d.compounds.clone(),
            feed_mole_fractions: d.feed_mole_fractions.clone(),
            feed_temperature_c: d.feed_temperature_c,
            feed_pressure_bar: d.feed_pressure_bar,
            feed_molar_flow_kmol_h: d.feed_molar_flow_kmol_h,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseKindDef {
    Pfr,
    Column,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepDef {
    pub case: CaseKindDef,
    #[serde(default)]
    pub grid: Vec<AxisDef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fixed: BTreeMap<String, f64>,
}

/// One swept parameter. Exactly one of `values` and `range` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeDef>,
}

impl AxisDef {
    pub fn values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: Some(values),
            range: None,
        }
    }

    pub fn range(name: impl Into<String>, range: RangeDef) -> Self {
        Self {
            name: name.into(),
            values: None,
            range: Some(range),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RangeDef {
    pub start: f64,
    pub end: f64,
    pub points: usize,
    #[serde(default)]
    pub spacing: SpacingDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpacingDef {
    #[default]
    Linear,
    Logarithmic,
}
