//! Engine session and flowsheet traits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::loopback::LoopbackEngine;

/// Kind of flowsheet object the engine can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    MaterialStream,
    PlugFlowReactor,
    DistillationColumn,
}

impl ObjectKind {
    pub fn is_unit_operation(self) -> bool {
        !matches!(self, Self::MaterialStream)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaterialStream => write!(f, "MaterialStream"),
            Self::PlugFlowReactor => write!(f, "RCT_PFR"),
            Self::DistillationColumn => write!(f, "DistillationColumn"),
        }
    }
}

/// Handle to an object living inside a flowsheet.
///
/// The engine addresses objects by their tag, so the handle is just the tag
/// plus the kind it was created with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub tag: String,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.tag, self.kind)
    }
}

/// Handle to a reaction registered on a flowsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactionRef(pub String);

/// Named properties of streams and unit operations.
///
/// All values are SI: K, Pa, mol/s, kg/s, W, m³.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    // Material streams
    Temperature,
    Pressure,
    MolarFlow,
    MassFlow,
    MoleFractions,
    // Plug-flow reactor
    Volume,
    OperationMode,
    HeatDuty,
    // Distillation column
    NumberOfStages,
    CondenserType,
    ReboilerType,
    RefluxRatio,
    DistillateMolarFlow,
    CondenserDuty,
    ReboilerDuty,
    CondenserTemperature,
}

impl Property {
    /// Name of the property in the engine's automation interface.
    pub fn engine_name(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Pressure => "Pressure",
            Self::MolarFlow => "MolarFlow",
            Self::MassFlow => "MassFlow",
            Self::MoleFractions => "MoleFractions",
            Self::Volume => "Volume",
            Self::OperationMode => "ReactorOperationMode",
            Self::HeatDuty => "DeltaQ",
            Self::NumberOfStages => "NumberOfStages",
            Self::CondenserType => "CondenserType",
            Self::ReboilerType => "ReboilerType",
            Self::RefluxRatio => "RefluxRatio",
            Self::DistillateMolarFlow => "ProductMolarFlowSpec1",
            Self::CondenserDuty => "CondenserDuty",
            Self::ReboilerDuty => "ReboilerDuty",
            Self::CondenserTemperature => "CondenserTemperature",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine_name())
    }
}

/// Value passed to or read from a property setter/getter.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Real(f64),
    Integer(i64),
    Vector(Vec<f64>),
}

impl PropertyValue {
    /// Read a scalar. Integers widen to `f64`.
    pub fn as_real(&self, tag: &str, property: Property) -> EngineResult<f64> {
        match self {
            Self::Real(v) => Ok(*v),
            Self::Integer(v) => Ok(*v as f64),
            Self::Vector(_) => Err(type_mismatch(tag, property, "scalar")),
        }
    }

    pub fn as_integer(&self, tag: &str, property: Property) -> EngineResult<i64> {
        match self {
            Self::Integer(v) => Ok(*v),
            _ => Err(type_mismatch(tag, property, "integer")),
        }
    }

    pub fn as_vector(&self, tag: &str, property: Property) -> EngineResult<&[f64]> {
        match self {
            Self::Vector(v) => Ok(v),
            _ => Err(type_mismatch(tag, property, "vector")),
        }
    }
}

fn type_mismatch(tag: &str, property: Property, expected: &str) -> EngineError {
    EngineError::InvalidProperty {
        tag: tag.to_string(),
        property: property.to_string(),
        reason: format!("expected a {} value", expected),
    }
}

/// Reactor operation mode codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorMode {
    Isothermal = 0,
    Adiabatic = 1,
}

/// Column condenser codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondenserKind {
    Total = 0,
    Partial = 1,
}

/// Column reboiler codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReboilerKind {
    Kettle = 0,
}

/// A conversion reaction definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionSpec {
    pub name: String,
    /// Compound the conversion refers to.
    pub base_reactant: String,
    /// Stoichiometric coefficients, negative for reactants.
    pub stoichiometry: Vec<(String, f64)>,
    /// Conversion expression as the engine evaluates it (a fraction, e.g. "0.5").
    pub expression: String,
}

/// Automation handle for one simulation engine instance.
///
/// There is one session per process run; flowsheets are opened and closed
/// through it once per case.
pub trait EngineSession {
    /// Backend name (for logging and the run manifest).
    fn backend_name(&self) -> &str;

    /// Create a new, empty flowsheet.
    fn open_flowsheet(&mut self) -> EngineResult<Box<dyn Flowsheet>>;
}

/// One engine-side simulation case.
///
/// A flowsheet must be released with [`Flowsheet::close`]; the engine
/// otherwise keeps its state alive for the rest of the session.
pub trait Flowsheet {
    /// Register a compound from the engine's database.
    fn add_compound(&mut self, name: &str) -> EngineResult<()>;

    /// Compounds registered so far, in registration order.
    fn compounds(&self) -> Vec<String>;

    /// Attach a thermodynamic property package by name.
    fn set_property_package(&mut self, name: &str) -> EngineResult<()>;

    /// Instantiate a stream or unit operation.
    fn add_object(&mut self, kind: ObjectKind, tag: &str) -> EngineResult<ObjectRef>;

    fn set_property(
        &mut self,
        object: &ObjectRef,
        property: Property,
        value: PropertyValue,
    ) -> EngineResult<()>;

    fn get_property(&self, object: &ObjectRef, property: Property) -> EngineResult<PropertyValue>;

    /// Connect `from`'s outlet port to `to`'s inlet port.
    fn connect(
        &mut self,
        from: &ObjectRef,
        to: &ObjectRef,
        from_port: usize,
        to_port: usize,
    ) -> EngineResult<()>;

    fn add_reaction(&mut self, spec: &ReactionSpec) -> EngineResult<ReactionRef>;

    fn attach_reaction(&mut self, unit: &ObjectRef, reaction: &ReactionRef) -> EngineResult<()>;

    /// Solve the whole flowsheet.
    fn solve(&mut self) -> EngineResult<()>;

    /// Release the flowsheet and all engine-side state it holds.
    fn close(self: Box<Self>) -> EngineResult<()>;
}

/// Available engine backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// In-process material-balance stand-in.
    #[default]
    Loopback,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loopback => write!(f, "loopback"),
        }
    }
}

/// Settings used to create the process-wide session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    pub backend: BackendKind,
}

/// Create the engine session selected by `settings`.
pub fn open_session(settings: &EngineSettings) -> EngineResult<Box<dyn EngineSession>> {
    match settings.backend {
        BackendKind::Loopback => Ok(Box::new(LoopbackEngine::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_values_widen_integers() {
        let v = PropertyValue::Integer(12);
        assert_eq!(v.as_real("Column", Property::NumberOfStages).unwrap(), 12.0);
        assert!(v.as_vector("Column", Property::NumberOfStages).is_err());
    }

    #[test]
    fn vector_is_not_a_scalar() {
        let v = PropertyValue::Vector(vec![0.5, 0.5]);
        let err = v.as_real("Feed", Property::MoleFractions).unwrap_err();
        assert!(err.to_string().contains("MoleFractions"));
    }

    #[test]
    fn engine_names_match_automation_interface() {
        assert_eq!(Property::HeatDuty.engine_name(), "DeltaQ");
        assert_eq!(Property::DistillateMolarFlow.engine_name(), "ProductMolarFlowSpec1");
        assert_eq!(ObjectKind::PlugFlowReactor.to_string(), "RCT_PFR");
    }

    #[test]
    fn loopback_session_opens() {
        let mut session = open_session(&EngineSettings::default()).unwrap();
        assert_eq!(session.backend_name(), "loopback");
        let sheet = session.open_flowsheet().unwrap();
        sheet.close().unwrap();
    }
}
