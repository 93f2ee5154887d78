//! Two-parameter Weibull distribution kernels.
//!
//! # Parameterization
//!
//! `Weibull(β, η)` where:
//! - `β` = shape parameter (β > 0), governs the hazard trend
//! - `η` = scale parameter (η > 0), the characteristic life (63.2% quantile)
//!
//! The density is: `f(t) = (β/η) (t/η)^(β-1) exp(-(t/η)^β)`
//!
//! Invalid parameters (non-positive or NaN) yield NaN everywhere.

use super::stable::{log1mexp, log_gamma};

fn params_valid(beta: f64, eta: f64) -> bool {
    beta > 0.0 && eta > 0.0 && beta.is_finite() && eta.is_finite()
}

/// Log of the Weibull PDF at t.
pub fn weibull_log_pdf(t: f64, beta: f64, eta: f64) -> f64 {
    if t.is_nan() || !params_valid(beta, eta) {
        return f64::NAN;
    }
    if t < 0.0 {
        return f64::NEG_INFINITY;
    }
    if t == 0.0 {
        return if beta < 1.0 {
            f64::INFINITY
        } else if beta == 1.0 {
            -eta.ln()
        } else {
            f64::NEG_INFINITY
        };
    }
    let log_ratio = t.ln() - eta.ln();
    beta.ln() - eta.ln() + (beta - 1.0) * log_ratio - (beta * log_ratio).exp()
}

/// Weibull CDF `F(t) = 1 - exp(-(t/η)^β)`.
pub fn weibull_cdf(t: f64, beta: f64, eta: f64) -> f64 {
    if t.is_nan() || !params_valid(beta, eta) {
        return f64::NAN;
    }
    if t <= 0.0 {
        return 0.0;
    }
    -(-(t / eta).powf(beta)).exp_m1()
}

/// Weibull survival (reliability) function `R(t) = exp(-(t/η)^β)`.
pub fn weibull_survival(t: f64, beta: f64, eta: f64) -> f64 {
    if t.is_nan() || !params_valid(beta, eta) {
        return f64::NAN;
    }
    if t <= 0.0 {
        return 1.0;
    }
    (-(t / eta).powf(beta)).exp()
}

/// Weibull hazard rate `h(t) = (β/η) (t/η)^(β-1)`.
pub fn weibull_hazard(t: f64, beta: f64, eta: f64) -> f64 {
    if t.is_nan() || !params_valid(beta, eta) {
        return f64::NAN;
    }
    if t < 0.0 {
        return 0.0;
    }
    (beta / eta) * (t / eta).powf(beta - 1.0)
}

/// Weibull quantile (inverse CDF): `t = η (-ln(1 - p))^(1/β)`.
///
/// `p` must lie in `[0, 1]`; `p = 1` maps to +∞.
pub fn weibull_quantile(p: f64, beta: f64, eta: f64) -> f64 {
    if p.is_nan() || !params_valid(beta, eta) || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    eta * (-(-p).ln_1p()).powf(1.0 / beta)
}

/// Mean of the Weibull distribution: `η Γ(1 + 1/β)`.
pub fn weibull_mean(beta: f64, eta: f64) -> f64 {
    if !params_valid(beta, eta) {
        return f64::NAN;
    }
    eta * log_gamma(1.0 + 1.0 / beta).exp()
}

/// Log of the CDF, `ln(1 - exp(-(t/η)^β))`.
pub fn weibull_log_cdf(t: f64, beta: f64, eta: f64) -> f64 {
    if t.is_nan() || !params_valid(beta, eta) {
        return f64::NAN;
    }
    if t <= 0.0 {
        return f64::NEG_INFINITY;
    }
    log1mexp((t / eta).powf(beta))
}

/// Right-censored Weibull log-likelihood.
///
/// ```text
/// L(β,η) = Σ_fail [ln β − ln η + (β−1)(ln t − ln η) − (t/η)^β]
///        + Σ_cens [−(t/η)^β]
/// ```
///
/// Returns NaN for invalid parameters or any non-positive time.
pub fn weibull_censored_log_likelihood(
    failures: &[f64],
    censored: &[f64],
    beta: f64,
    eta: f64,
) -> f64 {
    if !params_valid(beta, eta) {
        return f64::NAN;
    }
    if failures
        .iter()
        .chain(censored.iter())
        .any(|t| !(t.is_finite() && *t > 0.0))
    {
        return f64::NAN;
    }
    let fail_part: f64 = failures
        .iter()
        .map(|&t| weibull_log_pdf(t, beta, eta))
        .sum();
    let cens_part: f64 = censored.iter().map(|&t| -(t / eta).powf(beta)).sum();
    fail_part + cens_part
}
