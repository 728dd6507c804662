//! Case builder: turns case parameters into engine calls.
//!
//! User units are converted to the engine's SI contract here. Any engine
//! error propagates to the runner untouched.

use sf_core::units::{
    bar, celsius, cubic_meter_of, kelvin_of, kg_per_h_to_kg_per_s, kmol_per_h_to_mol_per_s, m3,
    pascal_of,
};
use sf_engine::{
    CondenserKind, EngineError, EngineResult, Flowsheet, ObjectKind, ObjectRef, Property,
    PropertyValue, ReactionSpec, ReactorMode, ReboilerKind,
};

use crate::case::{CaseParams, CaseTemplates, ColumnParams, ColumnTemplate, PfrParams, PfrTemplate};

/// Handles the runner needs after a case has been built.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltCase {
    Pfr {
        feed: ObjectRef,
        reactor: ObjectRef,
        outlet: ObjectRef,
        /// Position of the base reactant in the compound list.
        base_index: usize,
        /// Position of the key product in the compound list.
        product_index: usize,
    },
    Column {
        feed: ObjectRef,
        column: ObjectRef,
        distillate: ObjectRef,
        bottoms: ObjectRef,
    },
}

/// Build one case on an open flowsheet.
pub fn build_case(
    sheet: &mut dyn Flowsheet,
    params: &CaseParams,
    templates: &CaseTemplates,
    property_package: &str,
) -> EngineResult<BuiltCase> {
    match params {
        CaseParams::Pfr(p) => build_pfr(sheet, p, &templates.pfr, property_package),
        CaseParams::Column(c) => build_column(sheet, c, &templates.column, property_package),
    }
}

fn setup_thermo(
    sheet: &mut dyn Flowsheet,
    compounds: &[String],
    property_package: &str,
) -> EngineResult<()> {
    for compound in compounds {
        sheet.add_compound(compound)?;
    }
    sheet.set_property_package(property_package)
}

fn set_real(
    sheet: &mut dyn Flowsheet,
    object: &ObjectRef,
    property: Property,
    value: f64,
) -> EngineResult<()> {
    sheet.set_property(object, property, PropertyValue::Real(value))
}

fn position(compounds: &[String], name: &str) -> EngineResult<usize> {
    compounds
        .iter()
        .position(|c| c.eq_ignore_ascii_case(name))
        .ok_or_else(|| EngineError::UnknownCompound {
            name: name.to_string(),
        })
}

fn build_pfr(
    sheet: &mut dyn Flowsheet,
    params: &PfrParams,
    template: &PfrTemplate,
    property_package: &str,
) -> EngineResult<BuiltCase> {
    setup_thermo(sheet, &template.compounds, property_package)?;

    let feed = sheet.add_object(ObjectKind::MaterialStream, "Feed")?;
    set_real(
        sheet,
        &feed,
        Property::Temperature,
        kelvin_of(celsius(params.temperature_c)),
    )?;
    set_real(
        sheet,
        &feed,
        Property::Pressure,
        pascal_of(bar(params.pressure_bar)),
    )?;
    set_real(
        sheet,
        &feed,
        Property::MassFlow,
        kg_per_h_to_kg_per_s(template.feed_mass_flow_kg_h),
    )?;
    sheet.set_property(
        &feed,
        Property::MoleFractions,
        PropertyValue::Vector(template.feed_mole_fractions.clone()),
    )?;

    let reactor = sheet.add_object(ObjectKind::PlugFlowReactor, "PFR")?;
    set_real(
        sheet,
        &reactor,
        Property::Volume,
        cubic_meter_of(m3(params.volume_m3)),
    )?;
    sheet.set_property(
        &reactor,
        Property::OperationMode,
        PropertyValue::Integer(ReactorMode::Isothermal as i64),
    )?;

    let outlet = sheet.add_object(ObjectKind::MaterialStream, "Outlet")?;
    sheet.connect(&feed, &reactor, 0, 0)?;
    sheet.connect(&reactor, &outlet, 0, 0)?;

    let reaction = sheet.add_reaction(&ReactionSpec {
        name: "Conversion".to_string(),
        base_reactant: template.base_reactant.clone(),
        stoichiometry: template.stoichiometry.clone(),
        expression: template.conversion.to_string(),
    })?;
    sheet.attach_reaction(&reactor, &reaction)?;

    Ok(BuiltCase::Pfr {
        feed,
        reactor,
        outlet,
        base_index: position(&template.compounds, &template.base_reactant)?,
        product_index: position(&template.compounds, &template.key_product)?,
    })
}

fn build_column(
    sheet: &mut dyn Flowsheet,
    params: &ColumnParams,
    template: &ColumnTemplate,
    property_package: &str,
) -> EngineResult<BuiltCase> {
    setup_thermo(sheet, &template.compounds, property_package)?;

    let feed = sheet.add_object(ObjectKind::MaterialStream, "Feed")?;
    set_real(
        sheet,
        &feed,
        Property::Temperature,
        kelvin_of(celsius(template.feed_temperature_c)),
    )?;
    set_real(
        sheet,
        &feed,
        Property::Pressure,
        pascal_of(bar(template.feed_pressure_bar)),
    )?;
    set_real(
        sheet,
        &feed,
        Property::MolarFlow,
        kmol_per_h_to_mol_per_s(template.feed_molar_flow_kmol_h),
    )?;
    sheet.set_property(
        &feed,
        Property::MoleFractions,
        PropertyValue::Vector(template.feed_mole_fractions.clone()),
    )?;

    let column = sheet.add_object(ObjectKind::DistillationColumn, "Column")?;
    sheet.set_property(
        &column,
        Property::NumberOfStages,
        PropertyValue::Integer(params.n_stages.into()),
    )?;
    sheet.set_property(
        &column,
        Property::CondenserType,
        PropertyValue::Integer(CondenserKind::Total as i64),
    )?;
    sheet.set_property(
        &column,
        Property::ReboilerType,
        PropertyValue::Integer(ReboilerKind::Kettle as i64),
    )?;
    set_real(sheet, &column, Property::RefluxRatio, params.reflux_ratio)?;
    set_real(
        sheet,
        &column,
        Property::DistillateMolarFlow,
        kmol_per_h_to_mol_per_s(params.distillate_rate_kmol_h),
    )?;

    let distillate = sheet.add_object(ObjectKind::MaterialStream, "Distillate")?;
    let bottoms = sheet.add_object(ObjectKind::MaterialStream, "Bottoms")?;

    let feed_port = params.feed_stage.saturating_sub(1) as usize;
    sheet.connect(&feed, &column, 0, feed_port)?;
    sheet.connect(&column, &distillate, 0, 0)?;
    sheet.connect(&column, &bottoms, 1, 0)?;

    Ok(BuiltCase::Column {
        feed,
        column,
        distillate,
        bottoms,
    })
}
