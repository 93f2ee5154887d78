//! End-to-end study pipeline.
//!
//! generate → fit → Arrhenius → Kaplan–Meier → probability plot, returning a
//! single [`PipelineOutput`]. Regression and plot failures caused by skipped
//! cells are reported as notes; the fitted results are still returned.

use alt_common::{Error, LifetimeRecord, Result, StressCell, TestType, SCHEMA_VERSION};
use alt_config::{validate_study, FitOptions, StudyConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::inference::{
    fit_arrhenius, fit_records, fits_for_test_type, kaplan_meier_by_group, probability_plot,
    ArrheniusRegression, FitReport, KmCurve, ProbabilityPlot,
};
use crate::logging::{event_names, LogContext, Stage};
use crate::model::SyntheticGenerator;

/// What to derive from a record set.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub fit: FitOptions,
    pub arrhenius_test_type: TestType,
    pub probability_plot_cell: Option<StressCell>,
}

impl From<&StudyConfig> for AnalysisOptions {
    fn from(study: &StudyConfig) -> Self {
        AnalysisOptions {
            fit: study.fit.clone(),
            arrhenius_test_type: study.arrhenius_test_type,
            probability_plot_cell: Some(study.probability_plot_cell),
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// Generator seed; absent when the records were read from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub records: Vec<LifetimeRecord>,
    pub fit: FitReport,
    pub arrhenius: Option<ArrheniusRegression>,
    pub survival: Vec<KmCurve>,
    pub probability_plot: Option<ProbabilityPlot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Validate `study`, generate its records and analyze them.
pub fn run_pipeline(study: &StudyConfig, ctx: &LogContext) -> Result<PipelineOutput> {
    validate_study(study)?;

    crate::log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "study run started",
        seed = study.generator.seed,
        n_per_group = study.generator.n_per_group,
        cells = study.catalog.cells().len()
    );

    let generator = SyntheticGenerator::new(study.generator.clone(), study.catalog.clone())?;
    let records = generator.generate()?;

    let mut output = analyze_records(records, &AnalysisOptions::from(study), ctx)?;
    output.seed = Some(study.generator.seed);
    Ok(output)
}

/// Fit, regress and tabulate an existing record set.
pub fn analyze_records(
    records: Vec<LifetimeRecord>,
    options: &AnalysisOptions,
    ctx: &LogContext,
) -> Result<PipelineOutput> {
    if records.is_empty() {
        return Err(Error::EmptyInput("no lifetime records to analyze".to_string()));
    }

    let fit = fit_records(&records, &options.fit);
    let mut notes = Vec::new();

    let arrhenius = match fit_arrhenius(&fits_for_test_type(&fit.fits, options.arrhenius_test_type))
    {
        Ok(regression) => {
            crate::log_event!(
                ctx,
                INFO,
                event_names::REGRESS_FINISHED,
                Stage::Regress,
                "Arrhenius regression finished",
                test_type = tracing::field::display(&regression.coefficients.test_type),
                slope = regression.coefficients.slope,
                r_squared = regression.coefficients.r_squared,
                activation_energy_ev = regression.coefficients.activation_energy_ev
            );
            Some(regression)
        }
        Err(err @ (Error::EmptyInput(_) | Error::InsufficientTemperatures { .. })) => {
            crate::log_event!(
                ctx,
                WARN,
                event_names::REGRESS_FAILED,
                Stage::Regress,
                "Arrhenius regression not possible",
                reason = tracing::field::display(&err)
            );
            notes.push(format!("arrhenius: {}", err));
            None
        }
        Err(err) => return Err(err),
    };

    let survival = kaplan_meier_by_group(&records);

    let probability_plot = match options.probability_plot_cell {
        Some(cell) => match probability_plot(&records, &fit, &cell) {
            Ok(plot) => Some(plot),
            Err(err @ Error::CellNotFound { .. }) => {
                notes.push(format!("probability plot: {}", err));
                None
            }
            Err(err) => return Err(err),
        },
        None => None,
    };

    crate::log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Fit,
        "study run finished",
        records = records.len(),
        fitted = fit.fits.len(),
        skipped = fit.skipped.len()
    );

    Ok(PipelineOutput {
        schema_version: SCHEMA_VERSION.to_string(),
        run_id: ctx.run_id.clone(),
        generated_at: Utc::now(),
        seed: None,
        records,
        fit,
        arrhenius,
        survival,
        probability_plot,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alt_common::ErrorCategory;
    use alt_config::GeneratorConfig;

    fn study(n: usize) -> StudyConfig {
        StudyConfig {
            generator: GeneratorConfig {
                n_per_group: n,
                ..GeneratorConfig::default()
            },
            ..StudyConfig::default()
        }
    }

    #[test]
    fn default_study_end_to_end() {
        let out = run_pipeline(&study(80), &LogContext::new("run-test")).unwrap();
        assert_eq!(out.records.len(), 560);
        assert_eq!(out.seed, Some(2025));
        assert_eq!(out.run_id, "run-test");
        assert_eq!(out.fit.cell_count(), 7);

        let arrhenius = out.arrhenius.as_ref().expect("HTOL regression");
        assert_eq!(arrhenius.coefficients.test_type, TestType::Htol);
        assert_eq!(arrhenius.coefficients.n_temperatures, 2);
        // hotter cells fail sooner
        assert!(arrhenius.coefficients.slope > 0.0);

        // HTOL 125/150, THB 85, TC -40/125
        assert_eq!(out.survival.len(), 5);
        assert!(out.probability_plot.is_some());
    }

    #[test]
    fn tiny_groups_degrade_to_notes() {
        let out = run_pipeline(&study(3), &LogContext::new("run-small")).unwrap();
        assert!(out.fit.fits.is_empty());
        assert_eq!(out.fit.skipped.len(), 7);
        assert!(out.arrhenius.is_none());
        assert!(out.probability_plot.is_none());
        assert_eq!(out.notes.len(), 2);
    }

    #[test]
    fn invalid_study_rejected() {
        let mut bad = study(10);
        bad.generator.eta_ref = -1.0;
        let err = run_pipeline(&bad, &LogContext::new("run-bad")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn empty_records_rejected() {
        let err = analyze_records(
            Vec::new(),
            &AnalysisOptions::from(&StudyConfig::default()),
            &LogContext::new("run-empty"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::EmptyInput(_)));
    }

    #[test]
    fn output_serializes() {
        let out = run_pipeline(&study(20), &LogContext::new("run-json")).unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["schema_version"], SCHEMA_VERSION);
        assert_eq!(json["records"].as_array().unwrap().len(), 140);
        assert!(json["fit"]["fits"].is_array());
        assert!(json["survival"][0]["steps"].is_array());
    }
}
