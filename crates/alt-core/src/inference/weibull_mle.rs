//! Right-censored 2-parameter Weibull maximum likelihood.
//!
//! For a fixed shape β the likelihood is maximized in closed form by
//!
//! ```text
//! η̂(β) = (Σ_all t^β / r)^(1/β)        r = number of failures
//! ```
//!
//! and substituting it gives the profile score
//!
//! ```text
//! g(β) = r/β + Σ_fail ln t − r · S1/S0
//! S0 = Σ_all t^β,  S1 = Σ_all t^β ln t,  S2 = Σ_all t^β (ln t)²
//! g'(β) = −r/β² − r (S2 S0 − S1²)/S0²
//! ```
//!
//! g is strictly decreasing, so its unique root is the global maximum. The
//! root is found by Newton steps kept inside a sign-change bracket, falling
//! back to bisection when a step would leave it. All times are divided by the
//! largest observation first so `t^β` cannot overflow.
//!
//! Reference: Lawless (2003), *Statistical Models and Methods for Lifetime
//! Data*, 2nd ed., §4.1.

use alt_common::{ConfidenceBounds, FitError};
use alt_math::{fit_line, weibull_censored_log_likelihood};

/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.959_963_984_540_054;

/// Bracket expansion limits for β.
const MIN_SHAPE: f64 = 1e-6;
const MAX_SHAPE: f64 = 1e6;

/// Settings for one fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MleSettings {
    pub max_iterations: usize,
    /// Relative step tolerance: stop when `|Δβ| ≤ tolerance · max(1, β)`.
    pub tolerance: f64,
    pub confidence_bounds: bool,
}

impl Default for MleSettings {
    fn default() -> Self {
        MleSettings {
            max_iterations: 200,
            tolerance: 1e-10,
            confidence_bounds: true,
        }
    }
}

impl From<&alt_config::FitOptions> for MleSettings {
    fn from(opts: &alt_config::FitOptions) -> Self {
        MleSettings {
            max_iterations: opts.max_iterations,
            tolerance: opts.tolerance,
            confidence_bounds: opts.confidence_bounds,
        }
    }
}

/// Maximum likelihood estimate for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WeibullMle {
    pub shape: f64,
    pub scale: f64,
    pub log_likelihood: f64,
    /// Newton/bisection iterations after bracketing.
    pub iterations: usize,
    pub bounds: Option<ConfidenceBounds>,
}

/// Times divided by the largest observation, with their logs.
struct Scaled {
    /// ln(t / c) for every observation, failures first.
    ln_all: Vec<f64>,
    /// Σ_fail ln(t / c).
    sum_ln_fail: f64,
    r: f64,
    c: f64,
}

impl Scaled {
    fn new(failures: &[f64], censored: &[f64]) -> Self {
        let c = failures
            .iter()
            .chain(censored)
            .fold(0.0f64, |m, &t| m.max(t));
        let ln_all: Vec<f64> = failures
            .iter()
            .chain(censored)
            .map(|&t| (t / c).ln())
            .collect();
        let sum_ln_fail = ln_all[..failures.len()].iter().sum();
        Scaled {
            ln_all,
            sum_ln_fail,
            r: failures.len() as f64,
            c,
        }
    }

    /// (S0, S1, S2) at shape β in scaled units.
    fn sums(&self, beta: f64) -> (f64, f64, f64) {
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        let mut s2 = 0.0;
        for &lu in &self.ln_all {
            let w = (beta * lu).exp();
            s0 += w;
            s1 += w * lu;
            s2 += w * lu * lu;
        }
        (s0, s1, s2)
    }

    /// Profile score g(β) and its derivative.
    fn score(&self, beta: f64) -> (f64, f64) {
        let (s0, s1, s2) = self.sums(beta);
        let g = self.r / beta + self.sum_ln_fail - self.r * s1 / s0;
        let dg = -self.r / (beta * beta) - self.r * (s2 * s0 - s1 * s1) / (s0 * s0);
        (g, dg)
    }

    /// η̂(β) in scaled units.
    fn scale_at(&self, beta: f64) -> f64 {
        let (s0, _, _) = self.sums(beta);
        (s0 / self.r).powf(1.0 / beta)
    }
}

/// Fit β and η to right-censored data.
///
/// `failures` are observed failure times, `censored` are survivors'
/// observation times. At least one failure is required.
pub fn fit_censored_weibull(
    failures: &[f64],
    censored: &[f64],
    settings: &MleSettings,
) -> Result<WeibullMle, FitError> {
    if let Some(&value) = failures
        .iter()
        .chain(censored)
        .find(|t| !(t.is_finite() && **t > 0.0))
    {
        return Err(FitError::InvalidObservation { value });
    }
    if failures.is_empty() {
        return Err(FitError::Degenerate {
            reason: "no failures observed".to_string(),
        });
    }

    let data = Scaled::new(failures, censored);

    // g(β) → Σ_fail (ln t − ln t_max) as β → ∞; with every failure sitting
    // at the largest observation the limit is zero and no finite root exists.
    if data.ln_all[..failures.len()].iter().all(|&lu| lu == 0.0) {
        return Err(FitError::Degenerate {
            reason: "all failure times identical with no later censoring".to_string(),
        });
    }

    let beta0 = initial_shape(failures, censored);
    let (mut lo, mut hi) = bracket(&data, beta0)?;

    let tol = settings.tolerance;
    let mut beta = beta0.clamp(lo, hi);
    for iteration in 1..=settings.max_iterations {
        let (g, dg) = data.score(beta);
        if g == 0.0 {
            return Ok(finish(&data, failures, censored, beta, iteration, settings));
        }
        if g > 0.0 {
            lo = beta;
        } else {
            hi = beta;
        }

        let newton = beta - g / dg;
        let next = if newton.is_finite() && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };

        let step = (next - beta).abs();
        beta = next;
        if step <= tol * beta.max(1.0) || (hi - lo) <= tol * beta.max(1.0) {
            return Ok(finish(&data, failures, censored, beta, iteration, settings));
        }
    }

    Err(FitError::NonConvergence {
        iterations: settings.max_iterations,
        last_shape: beta,
    })
}

/// Find `lo < hi` with g(lo) > 0 > g(hi), starting from `beta0`.
fn bracket(data: &Scaled, beta0: f64) -> Result<(f64, f64), FitError> {
    let (g0, _) = data.score(beta0);
    if g0 > 0.0 {
        let mut lo = beta0;
        let mut hi = beta0 * 2.0;
        while data.score(hi).0 > 0.0 {
            lo = hi;
            hi *= 2.0;
            if hi > MAX_SHAPE {
                return Err(FitError::Degenerate {
                    reason: format!("shape estimate exceeds {MAX_SHAPE:e}"),
                });
            }
        }
        Ok((lo, hi))
    } else if g0 < 0.0 {
        let mut hi = beta0;
        let mut lo = beta0 * 0.5;
        while data.score(lo).0 < 0.0 {
            hi = lo;
            lo *= 0.5;
            if lo < MIN_SHAPE {
                return Err(FitError::Degenerate {
                    reason: format!("shape estimate below {MIN_SHAPE:e}"),
                });
            }
        }
        Ok((lo, hi))
    } else {
        Ok((beta0, beta0))
    }
}

fn finish(
    data: &Scaled,
    failures: &[f64],
    censored: &[f64],
    beta: f64,
    iterations: usize,
    settings: &MleSettings,
) -> WeibullMle {
    let eta_scaled = data.scale_at(beta);
    let scale = eta_scaled * data.c;
    let log_likelihood = weibull_censored_log_likelihood(failures, censored, beta, scale);
    let bounds = if settings.confidence_bounds {
        wald_bounds(data, beta, eta_scaled)
    } else {
        None
    };
    WeibullMle {
        shape: beta,
        scale,
        log_likelihood,
        iterations,
        bounds,
    }
}

/// 95% Wald bounds from the observed information, on the log scale.
///
/// `None` when the information matrix is not positive definite.
fn wald_bounds(data: &Scaled, beta: f64, eta: f64) -> Option<ConfidenceBounds> {
    let r = data.r;
    let ln_eta = eta.ln();
    let (mut sz, mut szl, mut szl2) = (0.0, 0.0, 0.0);
    for &lu in &data.ln_all {
        let l = lu - ln_eta;
        let z = (beta * l).exp();
        sz += z;
        szl += z * l;
        szl2 += z * l * l;
    }

    // Observed information = −Hessian of the log-likelihood
    let i_bb = r / (beta * beta) + szl2;
    let i_ee = -(r * beta - beta * (1.0 + beta) * sz) / (eta * eta);
    let i_be = -(-r + sz + beta * szl) / eta;

    let det = i_bb * i_ee - i_be * i_be;
    if !(i_bb > 0.0 && det > 0.0 && det.is_finite()) {
        return None;
    }
    let var_beta = i_ee / det;
    let var_eta = i_bb / det;
    if !(var_beta > 0.0 && var_eta > 0.0) {
        return None;
    }

    let se_ln_beta = var_beta.sqrt() / beta;
    let se_ln_eta = var_eta.sqrt() / eta;
    let scale = eta * data.c;
    Some(ConfidenceBounds {
        level: 0.95,
        shape_lower: beta * (-Z_95 * se_ln_beta).exp(),
        shape_upper: beta * (Z_95 * se_ln_beta).exp(),
        scale_lower: scale * (-Z_95 * se_ln_eta).exp(),
        scale_upper: scale * (Z_95 * se_ln_eta).exp(),
    })
}

/// Johnson adjusted ranks with Benard's median-rank approximation.
///
/// Returns `(t, F)` for every failure in ascending time order. Censored
/// observations shift the ranks of later failures; at tied times failures
/// are ranked before survivors.
pub fn adjusted_median_ranks(failures: &[f64], censored: &[f64]) -> Vec<(f64, f64)> {
    let mut all: Vec<(f64, bool)> = failures
        .iter()
        .map(|&t| (t, true))
        .chain(censored.iter().map(|&t| (t, false)))
        .collect();
    // Failures sort before survivors at equal times
    all.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)));

    let n = all.len() as f64;
    let mut prev_rank = 0.0;
    let mut points = Vec::with_capacity(failures.len());
    for (i, &(t, is_failure)) in all.iter().enumerate() {
        if !is_failure {
            continue;
        }
        let reverse_rank = n - i as f64;
        prev_rank += (n + 1.0 - prev_rank) / (1.0 + reverse_rank);
        let f = (prev_rank - 0.3) / (n + 0.4);
        points.push((t, f));
    }
    points
}

/// Median-rank regression estimate of β, or 1.0 when it is unusable.
pub fn initial_shape(failures: &[f64], censored: &[f64]) -> f64 {
    let points = adjusted_median_ranks(failures, censored);
    let xs: Vec<f64> = points.iter().map(|(t, _)| t.ln()).collect();
    let ys: Vec<f64> = points
        .iter()
        .map(|(_, f)| (-(-f).ln_1p()).ln())
        .collect();
    match fit_line(&xs, &ys) {
        Some(line) if line.slope.is_finite() && line.slope > 0.0 => {
            line.slope.clamp(MIN_SHAPE * 10.0, MAX_SHAPE / 10.0)
        }
        _ => 1.0,
    }
}
