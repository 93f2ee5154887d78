//! Accelerated life test math utilities.

pub mod math;

pub use math::linear::{fit_line, linspace, LinearFit};
pub use math::stable::*;
pub use math::weibull::*;
