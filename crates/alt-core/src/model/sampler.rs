//! Weibull lifetime sampler with right censoring.
//!
//! Each device consumes exactly three draws from the run's RNG, in order:
//! a uniform batch index, a Normal(1, σ) device multiplier, and a uniform
//! `u ∈ [0, 1)` fed to the inverse CDF `t = η (−ln(1−u))^(1/β)`.

use alt_common::BatchId;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::stress::{unit_normal, BatchEffects, ModelError};

/// One sampled device outcome before it is stamped with identity and cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSample {
    /// Index into the run's batch list.
    pub batch_index: usize,
    /// Effective scale after batch and device multipliers.
    pub scale: f64,
    /// Observed time: the failure time or the test end.
    pub observed_hours: f64,
    pub censored: bool,
    /// True when the scale or the failure time had to be lifted to stay positive.
    pub clamped: bool,
}

/// Sampler for one test type: fixed shape, test end and device spread.
#[derive(Debug, Clone)]
pub struct LifetimeSampler {
    shape: f64,
    test_end_hours: f64,
    device_noise: Normal<f64>,
}

impl LifetimeSampler {
    pub fn new(shape: f64, test_end_hours: f64, device_sigma: f64) -> Result<Self, ModelError> {
        Ok(LifetimeSampler {
            shape,
            test_end_hours,
            device_noise: unit_normal(device_sigma)?,
        })
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn test_end_hours(&self) -> f64 {
        self.test_end_hours
    }

    /// Draw one device for a cell with base scale `eta_base`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        eta_base: f64,
        batches: &BatchEffects,
        rng: &mut R,
    ) -> DeviceSample {
        let batch_index = rng.random_range(0..batches.len().max(1));
        let batch_effect = batches.get(batch_index).map_or(1.0, |(_, e)| e);
        let noise = self.device_noise.sample(rng);
        let u: f64 = rng.random();

        let mut clamped = false;
        let mut scale = eta_base * batch_effect * noise;
        if !(scale > 0.0) || !scale.is_finite() {
            scale = f64::MIN_POSITIVE;
            clamped = true;
        }

        let mut t = inverse_cdf(u, self.shape, scale);
        if !(t > 0.0) {
            t = f64::MIN_POSITIVE;
            clamped = true;
        }

        let (observed_hours, censored) = censor(t, self.test_end_hours);
        DeviceSample {
            batch_index,
            scale,
            observed_hours,
            censored,
            clamped,
        }
    }

    /// Batch label for a sample produced against `batches`.
    pub fn batch_of<'a>(sample: &DeviceSample, batches: &'a BatchEffects) -> Option<&'a BatchId> {
        batches.get(sample.batch_index).map(|(b, _)| b)
    }
}

/// Weibull inverse CDF `η (−ln(1−u))^(1/β)` for `u ∈ [0, 1)`.
pub fn inverse_cdf(u: f64, shape: f64, scale: f64) -> f64 {
    scale * (-(-u).ln_1p()).powf(1.0 / shape)
}

/// Apply right censoring at `test_end_hours`.
///
/// Times at or beyond the end are recorded as survivors at exactly the end.
pub fn censor(t: f64, test_end_hours: f64) -> (f64, bool) {
    if t >= test_end_hours {
        (test_end_hours, true)
    } else {
        (t, false)
    }
}
