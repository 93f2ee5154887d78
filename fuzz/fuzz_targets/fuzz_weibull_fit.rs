//! Fuzz target for the censored Weibull fitter.
//!
//! Arbitrary observation sets (including zeros, NaN and infinities) must
//! produce either a fit with positive finite parameters or a `FitError`.

#![no_main]

use alt_core::inference::{fit_censored_weibull, MleSettings};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    failures: Vec<f64>,
    censored: Vec<f64>,
    max_iterations: u8,
}

fuzz_target!(|input: Input| {
    let settings = MleSettings {
        max_iterations: usize::from(input.max_iterations).max(1),
        ..MleSettings::default()
    };
    if let Ok(fit) = fit_censored_weibull(&input.failures, &input.censored, &settings) {
        assert!(fit.shape.is_finite() && fit.shape > 0.0);
        assert!(fit.scale.is_finite() && fit.scale > 0.0);
    }
});
