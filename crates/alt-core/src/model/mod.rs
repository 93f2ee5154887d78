//! Lifetime model: stress acceleration, Weibull sampling and the synthetic
//! study generator.

pub mod generator;
pub mod sampler;
pub mod stress;

pub use generator::{synthesize, CellPlan, SyntheticGenerator};
pub use sampler::{censor, inverse_cdf, DeviceSample, LifetimeSampler};
pub use stress::{
    arrhenius_factor, target_scale, voltage_factor, BatchEffects, ModelError, StressModel,
};
