//! Stress-cell acceleration model.
//!
//! The characteristic life of a cell is the reference scale multiplied by an
//! Arrhenius temperature factor and a linear voltage derating factor:
//!
//! ```text
//! AF(T) = exp((Ea / k_B) · (1/T_K − 1/T_ref))
//! VF(V) = 1 / (1 + 0.15 · (V − 3.3))
//! η_base = η_ref · AF(T) · VF(V)
//! ```
//!
//! Batch effects are multiplicative Normal(1, σ) draws made once per batch.

use alt_common::{celsius_to_kelvin, BatchId, StressCell, BOLTZMANN_EV_PER_K};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;

/// Voltage at which the derating factor equals one.
pub const VOLTAGE_REFERENCE_V: f64 = 3.3;

/// Fractional life change per volt above the reference.
pub const VOLTAGE_SENSITIVITY_PER_V: f64 = 0.15;

/// Errors from the acceleration model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("voltage factor is not positive at {voltage_v} V (denominator {denominator})")]
    NonPositiveVoltageFactor { voltage_v: f64, denominator: f64 },

    #[error("temperature {temperature_c} °C is at or below absolute zero")]
    InvalidTemperature { temperature_c: f64 },

    #[error("invalid normal spread {sigma}: {message}")]
    InvalidSpread { sigma: f64, message: String },

    #[error("batch list is empty")]
    NoBatches,
}

impl From<ModelError> for alt_common::Error {
    fn from(err: ModelError) -> Self {
        alt_common::Error::Model(err.to_string())
    }
}

/// Arrhenius temperature acceleration factor relative to `t_ref_k`.
///
/// Equals 1 at the reference temperature. For `ea_ev > 0` the factor falls
/// as the stress temperature rises, so hotter cells get a shorter life.
pub fn arrhenius_factor(ea_ev: f64, temperature_c: f64, t_ref_k: f64) -> Result<f64, ModelError> {
    let t_k = celsius_to_kelvin(temperature_c);
    if !(t_k > 0.0) {
        return Err(ModelError::InvalidTemperature { temperature_c });
    }
    Ok(((ea_ev / BOLTZMANN_EV_PER_K) * (1.0 / t_k - 1.0 / t_ref_k)).exp())
}

/// Voltage derating factor `1 / (1 + 0.15 (V − 3.3))`.
///
/// Rejects voltages where the denominator is not positive (below roughly
/// −3.37 V) instead of returning a negative or infinite factor.
pub fn voltage_factor(voltage_v: f64) -> Result<f64, ModelError> {
    let denominator = 1.0 + VOLTAGE_SENSITIVITY_PER_V * (voltage_v - VOLTAGE_REFERENCE_V);
    if !(denominator > 0.0) {
        return Err(ModelError::NonPositiveVoltageFactor {
            voltage_v,
            denominator,
        });
    }
    let factor = 1.0 / denominator;
    if !factor.is_finite() {
        return Err(ModelError::NonPositiveVoltageFactor {
            voltage_v,
            denominator,
        });
    }
    Ok(factor)
}

/// Combine the reference scale with both acceleration factors.
pub fn target_scale(eta_ref: f64, arrhenius: f64, voltage: f64) -> f64 {
    eta_ref * arrhenius * voltage
}

/// Reference parameters of the acceleration model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressModel {
    /// Activation energy in eV.
    pub ea_ev: f64,
    /// Reference temperature in kelvin.
    pub t_ref_k: f64,
    /// Characteristic life at the reference condition, hours.
    pub eta_ref: f64,
}

impl StressModel {
    pub fn new(ea_ev: f64, t_ref_k: f64, eta_ref: f64) -> Self {
        StressModel {
            ea_ev,
            t_ref_k,
            eta_ref,
        }
    }

    /// `η_base` for one stress cell.
    pub fn cell_scale(&self, cell: &StressCell) -> Result<f64, ModelError> {
        let af = arrhenius_factor(self.ea_ev, cell.temperature_c, self.t_ref_k)?;
        let vf = voltage_factor(cell.voltage_v)?;
        Ok(target_scale(self.eta_ref, af, vf))
    }
}

/// Per-batch multiplicative effects, fixed for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEffects {
    effects: Vec<(BatchId, f64)>,
}

impl BatchEffects {
    /// Draw one Normal(1, `sigma`) effect per batch, in the given order.
    pub fn draw<R: Rng + ?Sized>(
        batches: &[BatchId],
        sigma: f64,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        if batches.is_empty() {
            return Err(ModelError::NoBatches);
        }
        let normal = unit_normal(sigma)?;
        let effects = batches
            .iter()
            .map(|b| (b.clone(), normal.sample(rng)))
            .collect();
        Ok(BatchEffects { effects })
    }

    /// Effects with known values, mainly for tests.
    pub fn fixed(effects: Vec<(BatchId, f64)>) -> Self {
        BatchEffects { effects }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Batch and effect at a position.
    pub fn get(&self, index: usize) -> Option<(&BatchId, f64)> {
        self.effects.get(index).map(|(b, e)| (b, *e))
    }

    /// Effect for a batch label.
    pub fn effect(&self, batch: &BatchId) -> Option<f64> {
        self.effects
            .iter()
            .find(|(b, _)| b == batch)
            .map(|(_, e)| *e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BatchId, f64)> {
        self.effects.iter().map(|(b, e)| (b, *e))
    }
}

/// Normal(1, sigma) used for batch and device multipliers.
pub(crate) fn unit_normal(sigma: f64) -> Result<Normal<f64>, ModelError> {
    Normal::new(1.0, sigma).map_err(|e| ModelError::InvalidSpread {
        sigma,
        message: e.to_string(),
    })
}
