//! Numerically stable special functions.

use std::f64::consts::PI;

const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8; // 0.5 * ln(2*pi)
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)] // These are published numerical constants
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the Gamma function (log |Gamma(z)|).
///
/// Uses a Lanczos approximation with reflection for z < 0.5.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return f64::INFINITY;
    }
    if z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z <= 0.0 && is_integer(z) {
        return f64::NAN;
    }
    if z < 0.5 {
        let sin_pi = (PI * z).sin();
        if sin_pi == 0.0 {
            return f64::NAN;
        }
        return PI.ln() - sin_pi.abs().ln() - log_gamma(1.0 - z);
    }

    let z_minus = z - 1.0;
    let mut x = LANCZOS_COEFFS[0];
    for (i, coeff) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += coeff / (z_minus + i as f64);
    }
    let t = z_minus + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (z_minus + 0.5) * t.ln() - t + x.ln()
}

/// The Gamma function Γ(z).
///
/// Computed as `exp(log_gamma(z))` with the sign restored for negative,
/// non-integer arguments. Poles (z = 0, -1, -2, ...) return NaN.
pub fn gamma(z: f64) -> f64 {
    let lg = log_gamma(z);
    if lg.is_nan() {
        return f64::NAN;
    }
    let magnitude = lg.exp();
    if z > 0.0 {
        return magnitude;
    }
    // Γ alternates sign between consecutive negative poles.
    if (z.floor() as i64) % 2 == 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// `ln(1 - exp(-x))` for `x > 0`, accurate for both small and large `x`.
pub fn log1mexp(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return f64::NEG_INFINITY;
    }
    if x < std::f64::consts::LN_2 {
        (-(-x).exp_m1()).ln()
    } else {
        (-(-x).exp()).ln_1p()
    }
}

fn is_integer(z: f64) -> bool {
    (z - z.round()).abs() < 1e-15
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log_gamma_known_values() {
        let lg1 = log_gamma(1.0);
        assert!(approx_eq(lg1, 0.0, 1e-12));

        let lg_half = log_gamma(0.5);
        let expected = 0.5 * PI.ln();
        assert!(approx_eq(lg_half, expected, 1e-10));

        let lg5 = log_gamma(5.0); // Gamma(5)=24
        assert!(approx_eq(lg5, 24.0f64.ln(), 1e-10));
    }

    #[test]
    fn gamma_one_and_a_half() {
        // Γ(1.5) = √π / 2
        let expected = PI.sqrt() / 2.0;
        assert!(approx_eq(gamma(1.5), expected, 1e-12));
    }

    #[test]
    fn gamma_integers_are_factorials() {
        assert!(approx_eq(gamma(1.0), 1.0, 1e-12));
        assert!(approx_eq(gamma(4.0), 6.0, 1e-10));
        assert!(approx_eq(gamma(7.0), 720.0, 1e-8));
    }

    #[test]
    fn gamma_negative_non_integer_sign() {
        // Γ(-0.5) = -2√π
        let expected = -2.0 * PI.sqrt();
        assert!(approx_eq(gamma(-0.5), expected, 1e-9));
        // Γ(-1.5) = 4√π / 3
        assert!(approx_eq(gamma(-1.5), 4.0 * PI.sqrt() / 3.0, 1e-9));
    }

    #[test]
    fn log_gamma_negative_integer_is_nan() {
        assert!(log_gamma(-2.0).is_nan());
        assert!(gamma(0.0).is_nan());
    }

    #[test]
    fn log1mexp_matches_naive_in_safe_range() {
        for x in [0.01, 0.3, 1.0, 5.0] {
            let naive = (1.0 - (-x as f64).exp()).ln();
            assert!(approx_eq(log1mexp(x), naive, 1e-12), "x={x}");
        }
        assert!(log1mexp(0.0).is_infinite());
        assert!(log1mexp(-1.0).is_nan());
    }
}
