//! Physical constants used by the acceleration models.

/// Boltzmann constant in eV/K (CODATA 2018, exact).
pub const BOLTZMANN_EV_PER_K: f64 = 8.617_333_262_145e-5;

/// Offset between degrees Celsius and kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Convert a temperature in °C to kelvin.
pub fn celsius_to_kelvin(t_c: f64) -> f64 {
    t_c + KELVIN_OFFSET
}
