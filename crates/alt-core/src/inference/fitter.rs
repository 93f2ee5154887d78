//! Per-cell Weibull fitting over a record set.
//!
//! Records are grouped by stress cell and each cell is fitted on its own.
//! A cell with fewer failures than `min_fails` is skipped as insufficient
//! data; a cell whose optimizer fails is skipped with the fit error. Neither
//! stops the other cells.

use std::collections::BTreeMap;

use alt_common::{
    HazardTrend, LifetimeRecord, SkipReason, SkippedCell, StressCell, WeibullFitResult,
};
use alt_config::FitOptions;
use alt_math::weibull_mean;
use rayon::prelude::*;
use serde::Serialize;

use super::weibull_mle::{fit_censored_weibull, MleSettings};
use crate::logging::{event_names, Stage};

/// Fits and skips for one record set, both sorted by stress cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FitReport {
    pub fits: Vec<WeibullFitResult>,
    pub skipped: Vec<SkippedCell>,
}

/// What happened to one stress cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellOutcome<'a> {
    Fitted(&'a WeibullFitResult),
    InsufficientData(&'a SkippedCell),
    FitFailed(&'a SkippedCell),
}

impl CellOutcome<'_> {
    pub fn cell(&self) -> StressCell {
        match self {
            CellOutcome::Fitted(fit) => fit.cell,
            CellOutcome::InsufficientData(skip) | CellOutcome::FitFailed(skip) => skip.cell,
        }
    }

    /// Stable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            CellOutcome::Fitted(_) => "fitted",
            CellOutcome::InsufficientData(_) => "skipped_insufficient_data",
            CellOutcome::FitFailed(_) => "skipped_fit_failed",
        }
    }
}

impl FitReport {
    /// Every cell in cell order, tagged with its outcome.
    pub fn outcomes(&self) -> Vec<CellOutcome<'_>> {
        let mut outcomes: Vec<CellOutcome<'_>> = self
            .fits
            .iter()
            .map(CellOutcome::Fitted)
            .chain(self.skipped.iter().map(|s| match s.reason {
                SkipReason::InsufficientData { .. } => CellOutcome::InsufficientData(s),
                SkipReason::FitFailed { .. } => CellOutcome::FitFailed(s),
            }))
            .collect();
        outcomes.sort_by_key(|o| o.cell());
        outcomes
    }

    pub fn cell_count(&self) -> usize {
        self.fits.len() + self.skipped.len()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Fit for one cell, if it was fitted.
    pub fn fit_for(&self, cell: &StressCell) -> Option<&WeibullFitResult> {
        self.fits.iter().find(|f| f.cell == *cell)
    }
}

/// Group records by cell, sorted by (test type, temperature, voltage).
pub fn group_by_cell(records: &[LifetimeRecord]) -> BTreeMap<StressCell, Vec<&LifetimeRecord>> {
    let mut groups: BTreeMap<StressCell, Vec<&LifetimeRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.cell()).or_default().push(record);
    }
    groups
}

/// Split a cell's records into failure and survivor times.
pub fn split_times(records: &[&LifetimeRecord]) -> (Vec<f64>, Vec<f64>) {
    let (fail, cens): (Vec<&&LifetimeRecord>, Vec<&&LifetimeRecord>) =
        records.iter().partition(|r| r.is_failure());
    (
        fail.iter().map(|r| r.observed_hours).collect(),
        cens.iter().map(|r| r.observed_hours).collect(),
    )
}

/// Fit one cell's records.
pub fn fit_cell(
    cell: StressCell,
    records: &[&LifetimeRecord],
    options: &FitOptions,
) -> Result<WeibullFitResult, SkippedCell> {
    let (failures, censored) = split_times(records);
    let skip = |reason| SkippedCell {
        cell,
        n_total: records.len(),
        n_failures: failures.len(),
        reason,
    };

    if failures.len() < options.min_fails {
        return Err(skip(SkipReason::InsufficientData {
            failures: failures.len(),
            min_fails: options.min_fails,
        }));
    }

    let mle = fit_censored_weibull(&failures, &censored, &MleSettings::from(options))
        .map_err(|error| skip(SkipReason::FitFailed { error }))?;

    Ok(WeibullFitResult {
        cell,
        n_total: records.len(),
        n_failures: failures.len(),
        n_censored: censored.len(),
        shape: mle.shape,
        scale: mle.scale,
        mttf_hours: weibull_mean(mle.shape, mle.scale),
        hazard: HazardTrend::from_shape(mle.shape),
        log_likelihood: mle.log_likelihood,
        iterations: mle.iterations,
        bounds: mle.bounds,
    })
}

/// Fit every stress cell present in `records`.
pub fn fit_records(records: &[LifetimeRecord], options: &FitOptions) -> FitReport {
    let groups: Vec<(StressCell, Vec<&LifetimeRecord>)> =
        group_by_cell(records).into_iter().collect();

    tracing::info!(
        target: event_names::FIT_STARTED,
        stage = %Stage::Fit,
        records = records.len(),
        cells = groups.len(),
        min_fails = options.min_fails,
        parallel = options.parallel,
        "fitting stress cells"
    );

    let fit_one = |(cell, group): &(StressCell, Vec<&LifetimeRecord>)| {
        fit_cell(*cell, group, options)
    };
    // Indexed collect keeps cell order in both paths
    let results: Vec<Result<WeibullFitResult, SkippedCell>> = if options.parallel {
        groups.par_iter().map(fit_one).collect()
    } else {
        groups.iter().map(fit_one).collect()
    };

    let mut report = FitReport::default();
    for result in results {
        match result {
            Ok(fit) => {
                tracing::debug!(
                    target: event_names::FIT_CELL_FITTED,
                    stage = %Stage::Fit,
                    cell = %fit.cell,
                    shape = fit.shape,
                    scale = fit.scale,
                    iterations = fit.iterations,
                    "cell fitted"
                );
                report.fits.push(fit);
            }
            Err(skip) => {
                tracing::warn!(
                    target: event_names::FIT_CELL_SKIPPED,
                    stage = %Stage::Fit,
                    cell = %skip.cell,
                    reason = skip.reason.tag(),
                    detail = %skip.reason,
                    "cell skipped"
                );
                report.skipped.push(skip);
            }
        }
    }

    tracing::info!(
        target: event_names::FIT_FINISHED,
        stage = %Stage::Fit,
        fitted = report.fits.len(),
        skipped = report.skipped.len(),
        "fitting finished"
    );
    report
}
