//! Arrhenius regression of fitted scale on inverse temperature.
//!
//! Fits `ln(η) = a + b / T_K` by ordinary least squares over the fitted
//! cells of one test type. Every fitted cell contributes one point, so cells
//! sharing a temperature at different voltages all enter the regression.

use alt_common::{
    celsius_to_kelvin, ArrheniusCoefficients, Error, Result, StressCell, TestType,
    WeibullFitResult, BOLTZMANN_EV_PER_K,
};
use alt_math::{fit_line, linspace};
use serde::Serialize;

use super::PlotPoint;

/// Default number of points on the prediction line.
pub const DEFAULT_LINE_POINTS: usize = 100;

/// Padding applied to the observed `1/T` range when drawing the line.
const LINE_LOW: f64 = 0.98;
const LINE_HIGH: f64 = 1.02;

/// One regression input point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrheniusPoint {
    pub cell: StressCell,
    /// `1 / T_K`.
    pub inverse_temperature: f64,
    pub ln_scale: f64,
}

/// Coefficients together with the points they were fitted on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrheniusRegression {
    pub coefficients: ArrheniusCoefficients,
    pub points: Vec<ArrheniusPoint>,
}

impl ArrheniusRegression {
    /// Smallest and largest `1/T` among the inputs.
    pub fn x_range(&self) -> (f64, f64) {
        self.points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.inverse_temperature), hi.max(p.inverse_temperature))
        })
    }

    /// `n` evenly spaced points of the fitted line over
    /// `[0.98·x_min, 1.02·x_max]`.
    pub fn prediction_line(&self, n: usize) -> Vec<PlotPoint> {
        let (lo, hi) = self.x_range();
        linspace(lo * LINE_LOW, hi * LINE_HIGH, n)
            .into_iter()
            .map(|x| PlotPoint {
                x,
                y: self.coefficients.intercept + self.coefficients.slope * x,
            })
            .collect()
    }
}

/// Fits of `test_type` only, in their original order.
pub fn fits_for_test_type(fits: &[WeibullFitResult], test_type: TestType) -> Vec<WeibullFitResult> {
    fits.iter()
        .filter(|f| f.cell.test_type == test_type)
        .cloned()
        .collect()
}

/// Regress `ln(η)` on `1/T_K` for fits that all share one test type.
pub fn fit_arrhenius(fits: &[WeibullFitResult]) -> Result<ArrheniusRegression> {
    let first = fits
        .first()
        .ok_or_else(|| Error::EmptyInput("no fits to regress".to_string()))?;
    let test_type = first.cell.test_type;
    if let Some(other) = fits.iter().find(|f| f.cell.test_type != test_type) {
        return Err(Error::MixedTestTypes {
            expected: test_type,
            found: other.cell.test_type,
        });
    }

    let mut temperatures: Vec<f64> = fits.iter().map(|f| f.cell.temperature_c).collect();
    temperatures.sort_by(f64::total_cmp);
    temperatures.dedup();
    if temperatures.len() < 2 {
        return Err(Error::InsufficientTemperatures {
            test_type,
            distinct: temperatures.len(),
        });
    }

    let points: Vec<ArrheniusPoint> = fits
        .iter()
        .map(|f| ArrheniusPoint {
            cell: f.cell,
            inverse_temperature: 1.0 / celsius_to_kelvin(f.cell.temperature_c),
            ln_scale: f.scale.ln(),
        })
        .collect();
    let xs: Vec<f64> = points.iter().map(|p| p.inverse_temperature).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.ln_scale).collect();

    let line = fit_line(&xs, &ys).ok_or_else(|| {
        Error::Model(format!(
            "Arrhenius regression for {} is degenerate (non-finite scale)",
            test_type
        ))
    })?;

    Ok(ArrheniusRegression {
        coefficients: ArrheniusCoefficients {
            test_type,
            intercept: line.intercept,
            slope: line.slope,
            r_squared: line.r_squared,
            n_points: line.n,
            n_temperatures: temperatures.len(),
            activation_energy_ev: line.slope * BOLTZMANN_EV_PER_K,
        },
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alt_common::HazardTrend;

    fn fit(test_type: TestType, temperature_c: f64, voltage_v: f64, scale: f64) -> WeibullFitResult {
        WeibullFitResult {
            cell: StressCell::new(test_type, temperature_c, voltage_v),
            n_total: 80,
            n_failures: 40,
            n_censored: 40,
            shape: 2.0,
            scale,
            mttf_hours: scale * 0.886_226_925_452_758,
            hazard: HazardTrend::Increasing,
            log_likelihood: -100.0,
            iterations: 6,
            bounds: None,
        }
    }

    fn on_line(temperature_c: f64, a: f64, b: f64) -> WeibullFitResult {
        let x = 1.0 / celsius_to_kelvin(temperature_c);
        fit(TestType::Htol, temperature_c, 5.0, (a + b * x).exp())
    }

    #[test]
    fn exact_line_recovered() {
        let fits = vec![
            on_line(100.0, 2.0, 3.0),
            on_line(125.0, 2.0, 3.0),
            on_line(150.0, 2.0, 3.0),
        ];
        let reg = fit_arrhenius(&fits).unwrap();
        let c = &reg.coefficients;
        assert!((c.intercept - 2.0).abs() < 1e-6);
        assert!((c.slope - 3.0).abs() < 1e-3);
        assert!((c.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(c.n_points, 3);
        assert_eq!(c.n_temperatures, 3);
    }

    #[test]
    fn activation_energy_from_slope() {
        let ea = 0.7;
        let b = ea / BOLTZMANN_EV_PER_K;
        let fits = vec![on_line(125.0, -10.0, b), on_line(150.0, -10.0, b)];
        let reg = fit_arrhenius(&fits).unwrap();
        assert!((reg.coefficients.activation_energy_ev - ea).abs() < 1e-6);
        let predicted = reg.coefficients.predict_scale(125.0);
        assert!((predicted / fits[0].scale - 1.0).abs() < 1e-9);
    }

    #[test]
    fn voltages_at_one_temperature_all_count() {
        let fits = vec![
            fit(TestType::Htol, 125.0, 4.5, 1500.0),
            fit(TestType::Htol, 125.0, 5.0, 1300.0),
            fit(TestType::Htol, 150.0, 4.5, 700.0),
            fit(TestType::Htol, 150.0, 5.0, 600.0),
        ];
        let reg = fit_arrhenius(&fits).unwrap();
        assert_eq!(reg.coefficients.n_points, 4);
        assert_eq!(reg.coefficients.n_temperatures, 2);
        assert!(reg.coefficients.slope > 0.0);
    }

    #[test]
    fn single_temperature_rejected() {
        let fits = vec![
            fit(TestType::Htol, 125.0, 4.5, 1500.0),
            fit(TestType::Htol, 125.0, 5.0, 1300.0),
        ];
        let err = fit_arrhenius(&fits).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientTemperatures {
                test_type: TestType::Htol,
                distinct: 1
            }
        ));
    }

    #[test]
    fn mixed_test_types_rejected() {
        let fits = vec![
            fit(TestType::Htol, 125.0, 5.0, 1500.0),
            fit(TestType::Tc, 150.0, 0.0, 900.0),
        ];
        let err = fit_arrhenius(&fits).unwrap_err();
        assert!(matches!(
            err,
            Error::MixedTestTypes {
                expected: TestType::Htol,
                found: TestType::Tc
            }
        ));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(fit_arrhenius(&[]), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn filter_then_regress() {
        let fits = vec![
            fit(TestType::Tc, -40.0, 0.0, 5000.0),
            fit(TestType::Htol, 125.0, 5.0, 1500.0),
            fit(TestType::Thb, 85.0, 3.3, 2500.0),
            fit(TestType::Htol, 150.0, 5.0, 700.0),
        ];
        let htol = fits_for_test_type(&fits, TestType::Htol);
        assert_eq!(htol.len(), 2);
        assert!(fit_arrhenius(&htol).is_ok());
    }

    #[test]
    fn prediction_line_spans_padded_range() {
        let fits = vec![on_line(125.0, 1.0, 2500.0), on_line(150.0, 1.0, 2500.0)];
        let reg = fit_arrhenius(&fits).unwrap();
        let line = reg.prediction_line(DEFAULT_LINE_POINTS);
        assert_eq!(line.len(), 100);

        let (lo, hi) = reg.x_range();
        assert!((line[0].x - lo * 0.98).abs() < 1e-15);
        assert!((line[99].x - hi * 1.02).abs() < 1e-15);
        for p in &line {
            assert!((p.y - (1.0 + 2500.0 * p.x)).abs() < 1e-6);
        }
    }
}
