//! Inference over lifetime records: censored Weibull fits per stress cell,
//! Arrhenius regression across temperatures, and the survival and
//! probability-plot tables renderers draw from.

pub mod arrhenius;
pub mod fitter;
pub mod kaplan_meier;
pub mod probability_plot;
pub mod weibull_mle;

use serde::Serialize;

pub use arrhenius::{
    fit_arrhenius, fits_for_test_type, ArrheniusPoint, ArrheniusRegression, DEFAULT_LINE_POINTS,
};
pub use fitter::{fit_cell, fit_records, group_by_cell, CellOutcome, FitReport};
pub use kaplan_meier::{kaplan_meier, kaplan_meier_by_group, KmCurve, KmStep};
pub use probability_plot::{probability_plot, ProbabilityPlot};
pub use weibull_mle::{fit_censored_weibull, MleSettings, WeibullMle};

/// A point in plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}
