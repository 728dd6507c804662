//! In-process stand-in backend.
//!
//! The loopback engine honours the whole automation contract but only does
//! material balances: conversion reactions are applied by stoichiometric
//! extent, columns split the feed sharply by normal boiling point, and the
//! reported duties come from catalog heats of vaporization. Streams keep
//! the feed temperature and pressure. It is meant for dry runs and tests,
//! not for engineering numbers.

use std::collections::HashMap;

use tracing::debug;

use crate::catalog::{CompoundData, find_compound, is_known_property_package};
use crate::error::{EngineError, EngineResult};
use crate::session::{
    EngineSession, Flowsheet, ObjectKind, ObjectRef, Property, PropertyValue, ReactionRef,
    ReactionSpec, ReactorMode,
};

const FRACTION_SUM_TOL: f64 = 1e-6;
const NEGATIVE_FLOW_TOL: f64 = 1e-12;

/// Loopback engine session.
#[derive(Debug, Default)]
pub struct LoopbackEngine {
    opened: usize,
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EngineSession for LoopbackEngine {
    fn backend_name(&self) -> &str {
        "loopback"
    }

    fn open_flowsheet(&mut self) -> EngineResult<Box<dyn Flowsheet>> {
        self.opened += 1;
        debug!(flowsheet = self.opened, "loopback: flowsheet opened");
        Ok(Box::new(LoopbackFlowsheet::new(self.opened)))
    }
}

#[derive(Debug)]
struct LoopbackObject {
    kind: ObjectKind,
    tag: String,
    values: HashMap<Property, PropertyValue>,
    reactions: Vec<ReactionRef>,
}

#[derive(Debug, Clone)]
struct Connection {
    from: String,
    to: String,
    from_port: usize,
    to_port: usize,
}

/// Resolved state of a material stream.
#[derive(Debug, Clone)]
struct StreamState {
    t_k: f64,
    p_pa: f64,
    /// Component molar flows [mol/s], in compound registration order.
    flows_mol_s: Vec<f64>,
}

impl StreamState {
    fn total(&self) -> f64 {
        self.flows_mol_s.iter().sum()
    }

    fn fractions(&self) -> Vec<f64> {
        let total = self.total();
        if total <= 0.0 {
            return vec![0.0; self.flows_mol_s.len()];
        }
        self.flows_mol_s.iter().map(|n| n / total).collect()
    }
}

/// Loopback flowsheet.
#[derive(Debug)]
pub struct LoopbackFlowsheet {
    id: usize,
    compounds: Vec<&'static CompoundData>,
    property_package: Option<String>,
    objects: Vec<LoopbackObject>,
    connections: Vec<Connection>,
    reactions: Vec<(ReactionRef, ReactionSpec)>,
}

impl LoopbackFlowsheet {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            compounds: Vec::new(),
            property_package: None,
            objects: Vec::new(),
            connections: Vec::new(),
            reactions: Vec::new(),
        }
    }

    fn object(&self, object: &ObjectRef) -> EngineResult<&LoopbackObject> {
        self.objects
            .iter()
            .find(|o| o.tag == object.tag && o.kind == object.kind)
            .ok_or_else(|| EngineError::UnknownObject {
                tag: object.tag.clone(),
            })
    }

    fn object_mut_by_tag(&mut self, tag: &str) -> EngineResult<&mut LoopbackObject> {
        self.objects
            .iter_mut()
            .find(|o| o.tag == tag)
            .ok_or_else(|| EngineError::UnknownObject {
                tag: tag.to_string(),
            })
    }

    fn object_by_tag(&self, tag: &str) -> EngineResult<&LoopbackObject> {
        self.objects
            .iter()
            .find(|o| o.tag == tag)
            .ok_or_else(|| EngineError::UnknownObject {
                tag: tag.to_string(),
            })
    }

    fn compound_index(&self, name: &str) -> Option<usize> {
        self.compounds.iter().position(|c| c.matches(name))
    }

    fn value(&self, tag: &str, property: Property) -> EngineResult<&PropertyValue> {
        self.object_by_tag(tag)?
            .values
            .get(&property)
            .ok_or_else(|| EngineError::PropertyUnavailable {
                tag: tag.to_string(),
                property: property.to_string(),
            })
    }

    fn real(&self, tag: &str, property: Property) -> EngineResult<f64> {
        self.value(tag, property)?.as_real(tag, property)
    }

    fn inlets(&self, unit: &str) -> Vec<&Connection> {
        self.connections.iter().filter(|c| c.to == unit).collect()
    }

    fn outlet(&self, unit: &str, port: usize) -> EngineResult<String> {
        self.connections
            .iter()
            .find(|c| c.from == unit && c.from_port == port)
            .map(|c| c.to.clone())
            .ok_or_else(|| EngineError::SolveFailed {
                message: format!("{} has no product stream on port {}", unit, port),
            })
    }

    fn stream_state(&self, tag: &str) -> EngineResult<StreamState> {
        let t_k = self.real(tag, Property::Temperature)?;
        let p_pa = self.real(tag, Property::Pressure)?;
        let fractions = self
            .value(tag, Property::MoleFractions)?
            .as_vector(tag, Property::MoleFractions)?
            .to_vec();

        if fractions.len() != self.compounds.len() {
            return Err(EngineError::SolveFailed {
                message: format!(
                    "{} has {} mole fractions for {} compounds",
                    tag,
                    fractions.len(),
                    self.compounds.len()
                ),
            });
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > FRACTION_SUM_TOL {
            return Err(EngineError::SolveFailed {
                message: format!("{} mole fractions sum to {}", tag, sum),
            });
        }

        let total_mol_s = if let Some(v) = self.object_by_tag(tag)?.values.get(&Property::MolarFlow)
        {
            v.as_real(tag, Property::MolarFlow)?
        } else if let Some(v) = self.object_by_tag(tag)?.values.get(&Property::MassFlow) {
            let mdot = v.as_real(tag, Property::MassFlow)?;
            let molar_mass: f64 = fractions
                .iter()
                .zip(&self.compounds)
                .map(|(x, c)| x * c.molar_mass_kg_mol())
                .sum();
            mdot / molar_mass
        } else {
            return Err(EngineError::SolveFailed {
                message: format!("{} has no flow specification", tag),
            });
        };

        Ok(StreamState {
            t_k,
            p_pa,
            flows_mol_s: fractions.iter().map(|x| x * total_mol_s).collect(),
        })
    }

    fn write_stream(&mut self, tag: &str, state: &StreamState) -> EngineResult<()> {
        let fractions = state.fractions();
        let total = state.total();
        let mass_flow: f64 = state
            .flows_mol_s
            .iter()
            .zip(&self.compounds)
            .map(|(n, c)| n * c.molar_mass_kg_mol())
            .sum();

        let stream = self.object_mut_by_tag(tag)?;
        stream.values.insert(Property::Temperature, PropertyValue::Real(state.t_k));
        stream.values.insert(Property::Pressure, PropertyValue::Real(state.p_pa));
        stream.values.insert(Property::MolarFlow, PropertyValue::Real(total));
        stream.values.insert(Property::MassFlow, PropertyValue::Real(mass_flow));
        stream
            .values
            .insert(Property::MoleFractions, PropertyValue::Vector(fractions));
        Ok(())
    }

    fn single_feed(&self, unit: &str) -> EngineResult<Connection> {
        let inlets = self.inlets(unit);
        match inlets.as_slice() {
            [one] => Ok((*one).clone()),
            [] => Err(EngineError::SolveFailed {
                message: format!("{} has no feed stream", unit),
            }),
            _ => Err(EngineError::SolveFailed {
                message: format!("{} has {} feed streams, expected one", unit, inlets.len()),
            }),
        }
    }

    fn solve_reactor(&mut self, tag: &str) -> EngineResult<()> {
        let volume = self.real(tag, Property::Volume)?;
        if volume <= 0.0 {
            return Err(EngineError::SolveFailed {
                message: format!("{} volume must be positive, got {}", tag, volume),
            });
        }

        let mode = match self.object_by_tag(tag)?.values.get(&Property::OperationMode) {
            Some(v) => v.as_integer(tag, Property::OperationMode)?,
            None => ReactorMode::Isothermal as i64,
        };
        if mode != ReactorMode::Isothermal as i64 {
            return Err(EngineError::SolveFailed {
                message: format!(
                    "{} operation mode {} needs an energy balance, loopback only supports isothermal",
                    tag, mode
                ),
            });
        }

        let feed = self.single_feed(tag)?;
        let mut state = self.stream_state(&feed.from)?;
        self.write_stream(&feed.from, &state)?;

        let attached = self.object_by_tag(tag)?.reactions.clone();
        for reaction in &attached {
            self.apply_conversion(reaction, &mut state)?;
        }

        let outlet = self.outlet(tag, 0)?;
        self.write_stream(&outlet, &state)?;
        self.object_mut_by_tag(tag)?
            .values
            .insert(Property::HeatDuty, PropertyValue::Real(0.0));
        Ok(())
    }

    fn apply_conversion(&self, reaction: &ReactionRef, state: &mut StreamState) -> EngineResult<()> {
        let spec = self
            .reactions
            .iter()
            .find(|(r, _)| r == reaction)
            .map(|(_, s)| s)
            .ok_or_else(|| EngineError::SolveFailed {
                message: format!("reaction {} is not defined", reaction.0),
            })?;

        let invalid = |reason: String| EngineError::InvalidReaction {
            name: spec.name.clone(),
            reason,
        };

        let conversion: f64 = spec
            .expression
            .trim()
            .parse()
            .map_err(|_| invalid(format!("cannot evaluate expression '{}'", spec.expression)))?;
        if !(0.0..=1.0).contains(&conversion) {
            return Err(invalid(format!("conversion {} outside [0, 1]", conversion)));
        }

        let base = self
            .compound_index(&spec.base_reactant)
            .ok_or_else(|| invalid(format!("base reactant {} not registered", spec.base_reactant)))?;
        let nu_base = spec
            .stoichiometry
            .iter()
            .find(|(name, _)| self.compound_index(name) == Some(base))
            .map(|(_, nu)| *nu)
            .ok_or_else(|| invalid("base reactant missing from stoichiometry".to_string()))?;

        let extent = conversion * state.flows_mol_s[base] / -nu_base;
        for (name, nu) in &spec.stoichiometry {
            let idx = self
                .compound_index(name)
                .ok_or_else(|| invalid(format!("compound {} not registered", name)))?;
            state.flows_mol_s[idx] += nu * extent;
        }

        for n in state.flows_mol_s.iter_mut() {
            if *n < -NEGATIVE_FLOW_TOL {
                return Err(EngineError::SolveFailed {
                    message: format!("reaction {} consumes more than is fed", spec.name),
                });
            }
            *n = n.max(0.0);
        }
        Ok(())
    }

    fn solve_column(&mut self, tag: &str) -> EngineResult<()> {
        let stages = self.real(tag, Property::NumberOfStages)?;
        if stages < 2.0 || stages.fract() != 0.0 {
            return Err(EngineError::SolveFailed {
                message: format!("{} needs a whole number of at least 2 stages, got {}", tag, stages),
            });
        }
        let reflux = self.real(tag, Property::RefluxRatio)?;
        if reflux <= 0.0 {
            return Err(EngineError::SolveFailed {
                message: format!("{} reflux ratio must be positive, got {}", tag, reflux),
            });
        }
        let distillate_mol_s = self.real(tag, Property::DistillateMolarFlow)?;

        let feed = self.single_feed(tag)?;
        if feed.to_port as f64 >= stages {
            return Err(EngineError::SolveFailed {
                message: format!(
                    "{} feed stage {} outside column of {} stages",
                    tag,
                    feed.to_port + 1,
                    stages
                ),
            });
        }
        let feed_state = self.stream_state(&feed.from)?;
        self.write_stream(&feed.from, &feed_state)?;
        let feed_total = feed_state.total();
        if distillate_mol_s <= 0.0 || distillate_mol_s >= feed_total {
            return Err(EngineError::SolveFailed {
                message: format!(
                    "{} distillate rate {} mol/s must lie strictly between 0 and the feed rate {} mol/s",
                    tag, distillate_mol_s, feed_total
                ),
            });
        }

        // Lightest components go overhead first.
        let mut order: Vec<usize> = (0..self.compounds.len()).collect();
        order.sort_by(|&a, &b| {
            self.compounds[a]
                .normal_boiling_k
                .total_cmp(&self.compounds[b].normal_boiling_k)
        });

        let mut remaining = distillate_mol_s;
        let mut top = vec![0.0; self.compounds.len()];
        for idx in order {
            let take = feed_state.flows_mol_s[idx].min(remaining);
            top[idx] = take;
            remaining -= take;
        }
        let bottom: Vec<f64> = feed_state
            .flows_mol_s
            .iter()
            .zip(&top)
            .map(|(n, d)| n - d)
            .collect();

        let distillate = StreamState {
            t_k: self.mixture_boiling_point(&top),
            p_pa: feed_state.p_pa,
            flows_mol_s: top,
        };
        let bottoms = StreamState {
            t_k: self.mixture_boiling_point(&bottom),
            p_pa: feed_state.p_pa,
            flows_mol_s: bottom,
        };

        let dh_vap: f64 = distillate
            .fractions()
            .iter()
            .zip(&self.compounds)
            .map(|(y, c)| y * c.dh_vap_j_mol)
            .sum();
        let condenser_duty_w = -(reflux + 1.0) * distillate_mol_s * dh_vap;

        let distillate_tag = self.outlet(tag, 0)?;
        let bottoms_tag = self.outlet(tag, 1)?;
        self.write_stream(&distillate_tag, &distillate)?;
        self.write_stream(&bottoms_tag, &bottoms)?;

        let column = self.object_mut_by_tag(tag)?;
        column
            .values
            .insert(Property::CondenserDuty, PropertyValue::Real(condenser_duty_w));
        column
            .values
            .insert(Property::ReboilerDuty, PropertyValue::Real(-condenser_duty_w));
        column.values.insert(
            Property::CondenserTemperature,
            PropertyValue::Real(distillate.t_k),
        );
        Ok(())
    }

    fn mixture_boiling_point(&self, flows: &[f64]) -> f64 {
        let total: f64 = flows.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        flows
            .iter()
            .zip(&self.compounds)
            .map(|(n, c)| n / total * c.normal_boiling_k)
            .sum()
    }
}

fn accepts(kind: ObjectKind, property: Property) -> bool {
    use Property::*;
    match kind {
        ObjectKind::MaterialStream => matches!(
            property,
            Temperature | Pressure | MolarFlow | MassFlow | MoleFractions
        ),
        ObjectKind::PlugFlowReactor => matches!(property, Volume | OperationMode),
        ObjectKind::DistillationColumn => matches!(
            property,
            NumberOfStages | CondenserType | ReboilerType | RefluxRatio | DistillateMolarFlow
        ),
    }
}

fn check_value(object: &ObjectRef, property: Property, value: &PropertyValue) -> EngineResult<()> {
    let invalid = |reason: &str| EngineError::InvalidProperty {
        tag: object.tag.clone(),
        property: property.to_string(),
        reason: reason.to_string(),
    };

    match value {
        PropertyValue::Real(v) if !v.is_finite() => Err(invalid("value is not finite")),
        PropertyValue::Vector(vs) if vs.iter().any(|v| !v.is_finite()) => {
            Err(invalid("vector contains non-finite entries"))
        }
        PropertyValue::Vector(_) if property != Property::MoleFractions => {
            Err(invalid("expected a scalar value"))
        }
        PropertyValue::Vector(vs) if vs.iter().any(|v| !(0.0..=1.0).contains(v)) => {
            Err(invalid("mole fractions must lie in [0, 1]"))
        }
        PropertyValue::Real(v)
            if matches!(
                property,
                Property::Temperature | Property::Pressure
            ) && *v <= 0.0 =>
        {
            Err(invalid("must be positive"))
        }
        PropertyValue::Real(v)
            if matches!(property, Property::MolarFlow | Property::MassFlow) && *v < 0.0 =>
        {
            Err(invalid("flow cannot be negative"))
        }
        _ => Ok(()),
    }
}

impl Flowsheet for LoopbackFlowsheet {
    fn add_compound(&mut self, name: &str) -> EngineResult<()> {
        let entry = find_compound(name).ok_or_else(|| EngineError::UnknownCompound {
            name: name.to_string(),
        })?;
        if self.compounds.iter().any(|c| c.name == entry.name) {
            return Err(EngineError::DuplicateCompound {
                name: entry.name.to_string(),
            });
        }
        self.compounds.push(entry);
        Ok(())
    }

    fn compounds(&self) -> Vec<String> {
        self.compounds.iter().map(|c| c.name.to_string()).collect()
    }

    fn set_property_package(&mut self, name: &str) -> EngineResult<()> {
        if !is_known_property_package(name) {
            return Err(EngineError::UnknownPropertyPackage {
                name: name.to_string(),
            });
        }
        self.property_package = Some(name.to_string());
        Ok(())
    }

    fn add_object(&mut self, kind: ObjectKind, tag: &str) -> EngineResult<ObjectRef> {
        if tag.trim().is_empty() {
            return Err(EngineError::Backend {
                message: "object tag must not be empty".to_string(),
            });
        }
        if self.objects.iter().any(|o| o.tag == tag) {
            return Err(EngineError::DuplicateObject {
                tag: tag.to_string(),
            });
        }
        self.objects.push(LoopbackObject {
            kind,
            tag: tag.to_string(),
            values: HashMap::new(),
            reactions: Vec::new(),
        });
        Ok(ObjectRef {
            kind,
            tag: tag.to_string(),
        })
    }

    fn set_property(
        &mut self,
        object: &ObjectRef,
        property: Property,
        value: PropertyValue,
    ) -> EngineResult<()> {
        self.object(object)?;
        if !accepts(object.kind, property) {
            return Err(EngineError::InvalidProperty {
                tag: object.tag.clone(),
                property: property.to_string(),
                reason: format!("not a writable property of {}", object.kind),
            });
        }
        check_value(object, property, &value)?;
        self.object_mut_by_tag(&object.tag)?
            .values
            .insert(property, value);
        Ok(())
    }

    fn get_property(&self, object: &ObjectRef, property: Property) -> EngineResult<PropertyValue> {
        self.object(object)?
            .values
            .get(&property)
            .cloned()
            .ok_or_else(|| EngineError::PropertyUnavailable {
                tag: object.tag.clone(),
                property: property.to_string(),
            })
    }

    fn connect(
        &mut self,
        from: &ObjectRef,
        to: &ObjectRef,
        from_port: usize,
        to_port: usize,
    ) -> EngineResult<()> {
        self.object(from)?;
        self.object(to)?;

        let invalid = |reason: &str| EngineError::InvalidConnection {
            from: from.tag.clone(),
            to: to.tag.clone(),
            reason: reason.to_string(),
        };

        if from.kind.is_unit_operation() == to.kind.is_unit_operation() {
            return Err(invalid("connections must join a stream and a unit operation"));
        }
        if self
            .connections
            .iter()
            .any(|c| c.to == to.tag && c.to_port == to_port)
        {
            return Err(invalid("inlet port already connected"));
        }
        if self
            .connections
            .iter()
            .any(|c| c.from == from.tag && c.from_port == from_port)
        {
            return Err(invalid("outlet port already connected"));
        }

        self.connections.push(Connection {
            from: from.tag.clone(),
            to: to.tag.clone(),
            from_port,
            to_port,
        });
        Ok(())
    }

    fn add_reaction(&mut self, spec: &ReactionSpec) -> EngineResult<ReactionRef> {
        let invalid = |reason: String| EngineError::InvalidReaction {
            name: spec.name.clone(),
            reason,
        };

        if spec.stoichiometry.is_empty() {
            return Err(invalid("stoichiometry is empty".to_string()));
        }
        for (name, nu) in &spec.stoichiometry {
            if self.compound_index(name).is_none() {
                return Err(invalid(format!("compound {} not registered", name)));
            }
            if !nu.is_finite() {
                return Err(invalid(format!("coefficient of {} is not finite", name)));
            }
        }
        let base = self
            .compound_index(&spec.base_reactant)
            .ok_or_else(|| invalid(format!("base reactant {} not registered", spec.base_reactant)))?;
        let nu_base = spec
            .stoichiometry
            .iter()
            .find(|(name, _)| self.compound_index(name) == Some(base))
            .map(|(_, nu)| *nu);
        match nu_base {
            Some(nu) if nu < 0.0 => {}
            Some(_) => return Err(invalid("base reactant must have a negative coefficient".to_string())),
            None => return Err(invalid("base reactant missing from stoichiometry".to_string())),
        }

        let reaction = ReactionRef(format!("rxn-{}-{}", self.id, self.reactions.len() + 1));
        self.reactions.push((reaction.clone(), spec.clone()));
        Ok(reaction)
    }

    fn attach_reaction(&mut self, unit: &ObjectRef, reaction: &ReactionRef) -> EngineResult<()> {
        if unit.kind != ObjectKind::PlugFlowReactor {
            return Err(EngineError::InvalidReaction {
                name: reaction.0.clone(),
                reason: format!("{} does not accept reactions", unit.tag),
            });
        }
        if !self.reactions.iter().any(|(r, _)| r == reaction) {
            return Err(EngineError::InvalidReaction {
                name: reaction.0.clone(),
                reason: "reaction is not defined on this flowsheet".to_string(),
            });
        }
        self.object(unit)?;
        self.object_mut_by_tag(&unit.tag)?
            .reactions
            .push(reaction.clone());
        Ok(())
    }

    fn solve(&mut self) -> EngineResult<()> {
        if self.property_package.is_none() {
            return Err(EngineError::SolveFailed {
                message: "no property package attached".to_string(),
            });
        }
        if self.compounds.is_empty() {
            return Err(EngineError::SolveFailed {
                message: "no compounds registered".to_string(),
            });
        }

        let units: Vec<(ObjectKind, String)> = self
            .objects
            .iter()
            .filter(|o| o.kind.is_unit_operation())
            .map(|o| (o.kind, o.tag.clone()))
            .collect();

        for (kind, tag) in units {
            match kind {
                ObjectKind::PlugFlowReactor => self.solve_reactor(&tag)?,
                ObjectKind::DistillationColumn => self.solve_column(&tag)?,
                ObjectKind::MaterialStream => {}
            }
        }
        debug!(flowsheet = self.id, "loopback: flowsheet solved");
        Ok(())
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        debug!(flowsheet = self.id, "loopback: flowsheet closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    fn sheet_with(compounds: &[&str]) -> LoopbackFlowsheet {
        let mut sheet = LoopbackFlowsheet::new(1);
        for c in compounds {
            sheet.add_compound(c).unwrap();
        }
        sheet.set_property_package("Peng-Robinson (PR)").unwrap();
        sheet
    }

    fn feed(sheet: &mut LoopbackFlowsheet, molar_flow: f64, fractions: Vec<f64>) -> ObjectRef {
        let feed = sheet.add_object(ObjectKind::MaterialStream, "Feed").unwrap();
        sheet
            .set_property(&feed, Property::Temperature, PropertyValue::Real(350.0))
            .unwrap();
        sheet
            .set_property(&feed, Property::Pressure, PropertyValue::Real(100_000.0))
            .unwrap();
        sheet
            .set_property(&feed, Property::MolarFlow, PropertyValue::Real(molar_flow))
            .unwrap();
        sheet
            .set_property(&feed, Property::MoleFractions, PropertyValue::Vector(fractions))
            .unwrap();
        feed
    }

    #[test]
    fn unknown_compound_is_rejected() {
        let mut sheet = LoopbackFlowsheet::new(1);
        let err = sheet.add_compound("Unobtainium").unwrap_err();
        assert!(matches!(err, EngineError::UnknownCompound { .. }));
        sheet.add_compound("Ethane").unwrap();
        assert!(matches!(
            sheet.add_compound("C2H6"),
            Err(EngineError::DuplicateCompound { .. })
        ));
    }

    #[test]
    fn conversion_reaction_moves_base_reactant() {
        let mut sheet = sheet_with(&["Ethane", "Propane"]);
        let feed = feed(&mut sheet, 10.0, vec![1.0, 0.0]);
        let pfr = sheet.add_object(ObjectKind::PlugFlowReactor, "PFR").unwrap();
        sheet
            .set_property(&pfr, Property::Volume, PropertyValue::Real(1.0))
            .unwrap();
        let out = sheet.add_object(ObjectKind::MaterialStream, "Outlet").unwrap();
        sheet.connect(&feed, &pfr, 0, 0).unwrap();
        sheet.connect(&pfr, &out, 0, 0).unwrap();

        let rxn = sheet
            .add_reaction(&ReactionSpec {
                name: "A to B".into(),
                base_reactant: "Ethane".into(),
                stoichiometry: vec![("Ethane".into(), -1.0), ("Propane".into(), 1.0)],
                expression: "0.25".into(),
            })
            .unwrap();
        sheet.attach_reaction(&pfr, &rxn).unwrap();
        sheet.solve().unwrap();

        let flow = sheet
            .get_property(&out, Property::MolarFlow)
            .unwrap()
            .as_real("Outlet", Property::MolarFlow)
            .unwrap();
        let x = sheet.get_property(&out, Property::MoleFractions).unwrap();
        let x = x.as_vector("Outlet", Property::MoleFractions).unwrap();
        assert!(close_to(flow, 10.0));
        assert!(close_to(x[0], 0.75));
        assert!(close_to(x[1], 0.25));

        let t = sheet
            .get_property(&out, Property::Temperature)
            .unwrap()
            .as_real("Outlet", Property::Temperature)
            .unwrap();
        assert!(close_to(t, 350.0));
    }

    #[test]
    fn mass_flow_feed_is_converted_with_molar_mass() {
        let mut sheet = sheet_with(&["Water"]);
        let feed = sheet.add_object(ObjectKind::MaterialStream, "Feed").unwrap();
        for (p, v) in [
            (Property::Temperature, 300.0),
            (Property::Pressure, 100_000.0),
            (Property::MassFlow, 0.018_015),
        ] {
            sheet.set_property(&feed, p, PropertyValue::Real(v)).unwrap();
        }
        sheet
            .set_property(&feed, Property::MoleFractions, PropertyValue::Vector(vec![1.0]))
            .unwrap();
        let state = sheet.stream_state("Feed").unwrap();
        assert!(close_to(state.total(), 1.0));
    }

    #[test]
    fn column_splits_light_component_overhead() {
        let mut sheet = sheet_with(&["Benzene", "Toluene"]);
        let feed = feed(&mut sheet, 20.0, vec![0.5, 0.5]);
        let col = sheet
            .add_object(ObjectKind::DistillationColumn, "Column")
            .unwrap();
        sheet
            .set_property(&col, Property::NumberOfStages, PropertyValue::Integer(10))
            .unwrap();
        sheet
            .set_property(&col, Property::RefluxRatio, PropertyValue::Real(2.0))
            .unwrap();
        sheet
            .set_property(&col, Property::DistillateMolarFlow, PropertyValue::Real(8.0))
            .unwrap();
        let d = sheet.add_object(ObjectKind::MaterialStream, "Distillate").unwrap();
        let b = sheet.add_object(ObjectKind::MaterialStream, "Bottoms").unwrap();
        sheet.connect(&feed, &col, 0, 4).unwrap();
        sheet.connect(&col, &d, 0, 0).unwrap();
        sheet.connect(&col, &b, 1, 0).unwrap();
        sheet.solve().unwrap();

        let xd = sheet.get_property(&d, Property::MoleFractions).unwrap();
        let xd = xd.as_vector("Distillate", Property::MoleFractions).unwrap();
        assert!(close_to(xd[0], 1.0));
        let xb = sheet.get_property(&b, Property::MoleFractions).unwrap();
        let xb = xb.as_vector("Bottoms", Property::MoleFractions).unwrap();
        assert!(close_to(xb[0], 2.0 / 12.0));

        let qc = sheet
            .get_property(&col, Property::CondenserDuty)
            .unwrap()
            .as_real("Column", Property::CondenserDuty)
            .unwrap();
        assert!(close_to(qc, -3.0 * 8.0 * 30_720.0));
        let tc = sheet
            .get_property(&col, Property::CondenserTemperature)
            .unwrap()
            .as_real("Column", Property::CondenserTemperature)
            .unwrap();
        assert!(close_to(tc, 353.24));
    }

    #[test]
    fn column_rejects_feed_below_last_stage() {
        let mut sheet = sheet_with(&["Benzene", "Toluene"]);
        let feed = feed(&mut sheet, 20.0, vec![0.5, 0.5]);
        let col = sheet
            .add_object(ObjectKind::DistillationColumn, "Column")
            .unwrap();
        sheet
            .set_property(&col, Property::NumberOfStages, PropertyValue::Integer(4))
            .unwrap();
        sheet
            .set_property(&col, Property::RefluxRatio, PropertyValue::Real(2.0))
            .unwrap();
        sheet
            .set_property(&col, Property::DistillateMolarFlow, PropertyValue::Real(8.0))
            .unwrap();
        sheet.connect(&feed, &col, 0, 6).unwrap();
        let err = sheet.solve().unwrap_err();
        assert!(err.to_string().contains("feed stage 7"));
    }

    #[test]
    fn products_unavailable_before_solve() {
        let mut sheet = sheet_with(&["Ethane"]);
        let out = sheet.add_object(ObjectKind::MaterialStream, "Outlet").unwrap();
        let err = sheet.get_property(&out, Property::MolarFlow).unwrap_err();
        assert!(matches!(err, EngineError::PropertyUnavailable { .. }));
    }

    #[test]
    fn read_only_and_invalid_values_are_rejected() {
        let mut sheet = sheet_with(&["Ethane"]);
        let pfr = sheet.add_object(ObjectKind::PlugFlowReactor, "PFR").unwrap();
        assert!(sheet
            .set_property(&pfr, Property::HeatDuty, PropertyValue::Real(1.0))
            .is_err());
        let feed = sheet.add_object(ObjectKind::MaterialStream, "Feed").unwrap();
        assert!(sheet
            .set_property(&feed, Property::Temperature, PropertyValue::Real(f64::NAN))
            .is_err());
        assert!(sheet
            .set_property(&feed, Property::Pressure, PropertyValue::Real(-1.0))
            .is_err());
    }

    #[test]
    fn stream_to_stream_connection_is_rejected() {
        let mut sheet = sheet_with(&["Ethane"]);
        let a = sheet.add_object(ObjectKind::MaterialStream, "A").unwrap();
        let b = sheet.add_object(ObjectKind::MaterialStream, "B").unwrap();
        assert!(matches!(
            sheet.connect(&a, &b, 0, 0),
            Err(EngineError::InvalidConnection { .. })
        ));
    }
}
