//! Weibull fit results, skip reporting and Arrhenius coefficients.

use crate::record::{StressCell, TestType};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hazard trend implied by the Weibull shape parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardTrend {
    /// β < 0.9: infant mortality, hazard falls with age.
    Decreasing,
    /// 0.9 ≤ β ≤ 1.1: random failures, roughly constant hazard.
    ApproximatelyConstant,
    /// β > 1.1: wear-out, hazard rises with age.
    Increasing,
}

impl HazardTrend {
    /// Shapes strictly below this are classified as decreasing.
    pub const DECREASING_BELOW: f64 = 0.9;
    /// Shapes strictly above this are classified as increasing.
    pub const INCREASING_ABOVE: f64 = 1.1;

    /// Classify a fitted shape parameter. Both thresholds are inclusive on
    /// the constant side.
    pub fn from_shape(beta: f64) -> HazardTrend {
        if beta < Self::DECREASING_BELOW {
            HazardTrend::Decreasing
        } else if beta <= Self::INCREASING_ABOVE {
            HazardTrend::ApproximatelyConstant
        } else {
            HazardTrend::Increasing
        }
    }

    /// Human-readable interpretation.
    pub fn interpretation(&self) -> &'static str {
        match self {
            HazardTrend::Decreasing => "Decreasing hazard",
            HazardTrend::ApproximatelyConstant => "~Constant hazard",
            HazardTrend::Increasing => "Increasing hazard",
        }
    }
}

impl fmt::Display for HazardTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardTrend::Decreasing => write!(f, "decreasing"),
            HazardTrend::ApproximatelyConstant => write!(f, "approximately_constant"),
            HazardTrend::Increasing => write!(f, "increasing"),
        }
    }
}

/// Two-sided Wald confidence bounds on the fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBounds {
    /// Confidence level, e.g. 0.95.
    pub level: f64,
    pub shape_lower: f64,
    pub shape_upper: f64,
    pub scale_lower: f64,
    pub scale_upper: f64,
}

/// Fitted 2-parameter Weibull for one stress cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeibullFitResult {
    pub cell: StressCell,
    pub n_total: usize,
    pub n_failures: usize,
    pub n_censored: usize,
    /// Shape parameter β.
    pub shape: f64,
    /// Scale parameter η in hours.
    pub scale: f64,
    /// Mean time to failure `η Γ(1 + 1/β)` in hours.
    pub mttf_hours: f64,
    pub hazard: HazardTrend,
    pub log_likelihood: f64,
    pub iterations: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<ConfidenceBounds>,
}

/// Why the MLE could not produce parameters for a cell.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitError {
    #[error("observed time {value} is not a positive finite number")]
    InvalidObservation { value: f64 },

    #[error("degenerate sample: {reason}")]
    Degenerate { reason: String },

    #[error("optimizer did not converge after {iterations} iterations (last shape {last_shape})")]
    NonConvergence { iterations: usize, last_shape: f64 },
}

impl FitError {
    /// Stable tag for tabular output.
    pub fn tag(&self) -> &'static str {
        match self {
            FitError::InvalidObservation { .. } => "invalid_observation",
            FitError::Degenerate { .. } => "degenerate",
            FitError::NonConvergence { .. } => "non_convergence",
        }
    }
}

/// Reason a stress cell has no fit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer failures than the configured minimum.
    InsufficientData { failures: usize, min_fails: usize },
    /// The optimizer ran but could not produce parameters.
    FitFailed { error: FitError },
}

impl SkipReason {
    /// Stable tag for tabular output.
    pub fn tag(&self) -> &'static str {
        match self {
            SkipReason::InsufficientData { .. } => "insufficient_data",
            SkipReason::FitFailed { .. } => "fit_failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientData {
                failures,
                min_fails,
            } => write!(f, "insufficient data: {failures} failures < {min_fails}"),
            SkipReason::FitFailed { error } => write!(f, "fit failed: {error}"),
        }
    }
}

/// A stress cell reported as skipped by the fitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCell {
    pub cell: StressCell,
    pub n_total: usize,
    pub n_failures: usize,
    pub reason: SkipReason,
}

/// Coefficients of `ln(η) = a + b·(1/T_K)` for one test type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusCoefficients {
    pub test_type: TestType,
    /// Intercept `a`.
    pub intercept: f64,
    /// Slope `b` in kelvin.
    pub slope: f64,
    pub r_squared: f64,
    pub n_points: usize,
    pub n_temperatures: usize,
    /// Activation energy implied by the slope, `b · k_B`, in eV.
    pub activation_energy_ev: f64,
}

impl ArrheniusCoefficients {
    /// Predicted `ln(η)` at a temperature in °C.
    pub fn predict_ln_scale(&self, temperature_c: f64) -> f64 {
        self.intercept + self.slope / crate::physics::celsius_to_kelvin(temperature_c)
    }

    /// Predicted characteristic life in hours at a temperature in °C.
    pub fn predict_scale(&self, temperature_c: f64) -> f64 {
        self.predict_ln_scale(temperature_c).exp()
    }
}
