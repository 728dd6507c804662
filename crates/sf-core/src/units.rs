// sf-core/src/units.rs
//
// The engine boundary speaks SI (K, Pa, mol/s, kg/s, W, m³). Study files and
// result columns use process units (°C, bar, kmol/h, kg/h, kW). Every
// conversion between the two goes through this module.

use uom::si::f64::{
    Power as UomPower, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Volume = UomVolume;

pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const MOL_PER_KMOL: f64 = 1000.0;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn kelvin_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[inline]
pub fn celsius_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}

#[inline]
pub fn pascal_of(p: Pressure) -> f64 {
    use uom::si::pressure::pascal;
    p.get::<pascal>()
}

#[inline]
pub fn bar_of(p: Pressure) -> f64 {
    use uom::si::pressure::bar;
    p.get::<bar>()
}

#[inline]
pub fn kilowatt_of(q: Power) -> f64 {
    use uom::si::power::kilowatt;
    q.get::<kilowatt>()
}

#[inline]
pub fn cubic_meter_of(v: Volume) -> f64 {
    use uom::si::volume::cubic_meter;
    v.get::<cubic_meter>()
}

/// kmol/h → mol/s
#[inline]
pub fn kmol_per_h_to_mol_per_s(v: f64) -> f64 {
    v * MOL_PER_KMOL / SECONDS_PER_HOUR
}

/// kg/h → kg/s
#[inline]
pub fn kg_per_h_to_kg_per_s(v: f64) -> f64 {
    v / SECONDS_PER_HOUR
}
