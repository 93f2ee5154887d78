//! Ordinary least-squares line fitting.

use serde::{Deserialize, Serialize};

/// Result of fitting `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Coefficient of determination. Defined as 1.0 when all `y` are equal
    /// and the line reproduces them exactly.
    pub r_squared: f64,
    pub n: usize,
}

impl LinearFit {
    /// Evaluate the fitted line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a straight line by ordinary least squares.
///
/// Minimizes `Σ (y_i - a - b x_i)²` using centered sums for stability.
///
/// # Returns
/// `None` if the slices differ in length, hold fewer than two points,
/// contain non-finite values, or all `x` are identical.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len();
    if n != ys.len() || n < 2 {
        return None;
    }
    if !xs.iter().chain(ys.iter()).all(|v| v.is_finite()) {
        return None;
    }

    let n_f = n as f64;
    let mean_x = xs.iter().sum::<f64>() / n_f;
    let mean_y = ys.iter().sum::<f64>() / n_f;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    // Scale-aware degeneracy check: 1/T values live around 1e-3.
    let scale = xs.iter().fold(0.0f64, |m, x| m.max(x.abs())).max(f64::MIN_POSITIVE);
    if sxx <= (scale * 1e-12).powi(2) * n_f {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - (intercept + slope * x);
            r * r
        })
        .sum();

    let r_squared = if syy == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        (1.0 - ss_res / syy).clamp(0.0, 1.0)
    };

    Some(LinearFit {
        intercept,
        slope,
        r_squared,
        n,
    })
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_recovered() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 + 3.0 * x).collect();
        let fit = fit_line(&xs, &ys).unwrap();
        assert!((fit.intercept - 2.0).abs() < 1e-12);
        assert!((fit.slope - 3.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.n, 4);
        assert!((fit.predict(10.0) - 32.0).abs() < 1e-10);
    }

    #[test]
    fn small_inverse_temperature_scale() {
        // x values on the 1/T_K scale
        let xs = [1.0 / 398.15, 1.0 / 423.15, 1.0 / 358.15];
        let ys: Vec<f64> = xs.iter().map(|x| -5.0 + 6963.0 * x).collect();
        let fit = fit_line(&xs, &ys).unwrap();
        assert!((fit.slope - 6963.0).abs() < 1e-6);
        assert!((fit.intercept + 5.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_line_has_r_squared_below_one() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [1.1, 1.9, 3.2, 3.8, 5.1];
        let fit = fit_line(&xs, &ys).unwrap();
        assert!(fit.r_squared > 0.9 && fit.r_squared < 1.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(fit_line(&[1.0], &[1.0]).is_none());
        assert!(fit_line(&[1.0, 2.0], &[1.0]).is_none());
        assert!(fit_line(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(fit_line(&[1.0, f64::NAN], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn linspace_endpoints() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }
}
