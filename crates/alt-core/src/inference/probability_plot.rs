//! Weibull probability plot coordinates for one stress cell.
//!
//! On Weibull paper a two-parameter Weibull sample is a straight line:
//! `x = ln t`, `y = ln(−ln(1 − F))`, with slope β crossing zero at `ln η`.

use alt_common::{Error, LifetimeRecord, Result, StressCell};
use alt_math::linspace;
use serde::Serialize;

use super::fitter::{split_times, FitReport};
use super::weibull_mle::adjusted_median_ranks;
use super::PlotPoint;

/// Points on the fitted line.
pub const FITTED_LINE_POINTS: usize = 50;

/// Plot data for one fitted cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityPlot {
    pub cell: StressCell,
    pub shape: f64,
    pub scale: f64,
    /// Failures at their adjusted median ranks.
    pub points: Vec<PlotPoint>,
    /// `y = β (ln t − ln η)` across the plotted range.
    pub fitted_line: Vec<PlotPoint>,
}

/// Transform a failure time and unreliability to Weibull paper.
pub fn weibull_paper(t: f64, unreliability: f64) -> PlotPoint {
    PlotPoint {
        x: t.ln(),
        y: (-(-unreliability).ln_1p()).ln(),
    }
}

/// Build plot data for `cell` from its records and its fit in `report`.
pub fn probability_plot(
    records: &[LifetimeRecord],
    report: &FitReport,
    cell: &StressCell,
) -> Result<ProbabilityPlot> {
    let not_found = || Error::CellNotFound {
        cell: cell.to_string(),
    };
    let fit = report.fit_for(cell).ok_or_else(not_found)?;

    let in_cell: Vec<&LifetimeRecord> = records.iter().filter(|r| r.cell() == *cell).collect();
    if in_cell.is_empty() {
        return Err(not_found());
    }
    let (failures, censored) = split_times(&in_cell);

    let points: Vec<PlotPoint> = adjusted_median_ranks(&failures, &censored)
        .into_iter()
        .map(|(t, f)| weibull_paper(t, f))
        .collect();

    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
    let ln_scale = fit.scale.ln();
    let fitted_line = if lo.is_finite() && hi.is_finite() {
        linspace(lo, hi, FITTED_LINE_POINTS)
            .into_iter()
            .map(|x| PlotPoint {
                x,
                y: fit.shape * (x - ln_scale),
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(ProbabilityPlot {
        cell: *cell,
        shape: fit.shape,
        scale: fit.scale,
        points,
        fitted_line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::fitter::fit_records;
    use alt_common::{BatchId, DeviceId, TestType};
    use alt_config::FitOptions;
    use alt_math::weibull_quantile;

    fn records(cell: StressCell, n: usize, end: f64) -> Vec<LifetimeRecord> {
        (1..=n)
            .map(|i| {
                let t = weibull_quantile((i as f64 - 0.5) / n as f64, 2.0, 500.0);
                LifetimeRecord {
                    device_id: DeviceId(i as u32),
                    test_type: cell.test_type,
                    stress_temperature_c: cell.temperature_c,
                    stress_voltage_v: cell.voltage_v,
                    observed_hours: t.min(end),
                    censored: t >= end,
                    batch_id: BatchId::from("B1"),
                }
            })
            .collect()
    }

    #[test]
    fn points_lie_near_fitted_line() {
        let cell = StressCell::new(TestType::Htol, 150.0, 5.0);
        let data = records(cell, 60, 700.0);
        let report = fit_records(&data, &FitOptions::default());
        let plot = probability_plot(&data, &report, &cell).unwrap();

        let failures = data.iter().filter(|r| !r.censored).count();
        assert_eq!(plot.points.len(), failures);
        assert_eq!(plot.fitted_line.len(), FITTED_LINE_POINTS);
        assert!(plot.points.windows(2).all(|w| w[0].x <= w[1].x && w[0].y < w[1].y));

        for p in &plot.points {
            let line_y = plot.shape * (p.x - plot.scale.ln());
            assert!((p.y - line_y).abs() < 0.5, "point {p:?} far from line");
        }
    }

    #[test]
    fn fitted_line_has_fitted_slope() {
        let cell = StressCell::new(TestType::Thb, 85.0, 3.3);
        let data = records(cell, 30, f64::INFINITY);
        let report = fit_records(&data, &FitOptions::default());
        let plot = probability_plot(&data, &report, &cell).unwrap();
        let ln_scale = plot.scale.ln();
        for p in &plot.fitted_line {
            assert!((p.y - plot.shape * (p.x - ln_scale)).abs() < 1e-12);
        }
        let first = plot.fitted_line[0];
        let last = plot.fitted_line[FITTED_LINE_POINTS - 1];
        assert_eq!(first.x, plot.points[0].x);
        assert_eq!(last.x, plot.points[plot.points.len() - 1].x);
        assert!(first.y < 0.0 && last.y > 0.0);
    }

    #[test]
    fn unknown_cell_is_an_error() {
        let cell = StressCell::new(TestType::Htol, 150.0, 5.0);
        let data = records(cell, 20, 700.0);
        let report = fit_records(&data, &FitOptions::default());
        let missing = StressCell::new(TestType::Htol, 175.0, 5.0);
        let err = probability_plot(&data, &report, &missing).unwrap_err();
        assert!(matches!(err, Error::CellNotFound { .. }));
        assert!(err.to_string().contains("HTOL 175"));
    }

    #[test]
    fn paper_transform() {
        let p = weibull_paper(std::f64::consts::E, 1.0 - (-1.0f64).exp());
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }
}
