// tg-core/src/units.rs

use uom::si::f64::ThermodynamicTemperature as UomThermodynamicTemperature;

// Public canonical unit type (SI, f64)
pub type Temperature = UomThermodynamicTemperature;

/// Absolute zero expressed in degrees Celsius.
pub const ABSOLUTE_ZERO_C: f64 = -273.15;

#[inline]
pub fn deg_c(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

/// Absolute temperature in kelvin.
#[inline]
pub fn kelvin_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

/// Convert a tempering temperature in °C to kelvin.
#[inline]
pub fn celsius_to_kelvin(v: f64) -> f64 {
    kelvin_of(deg_c(v))
}
