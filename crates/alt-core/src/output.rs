//! Rendering of command payloads in the supported output formats.
//!
//! JSON is the full document. JSONL emits one object per row (records,
//! fits, skipped cells). Markdown is for people; summary is a single line.

use alt_common::{LifetimeRecord, OutputFormat, Result};
use alt_config::Catalog;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

use crate::inference::{ArrheniusRegression, CellOutcome, FitReport, KmCurve};
use crate::pipeline::PipelineOutput;

/// A payload that can be rendered in every output format.
pub trait Render: Serialize {
    /// Rows for JSONL output. Defaults to the whole document as one row.
    fn jsonl_rows(&self) -> Result<Vec<Value>> {
        Ok(vec![serde_json::to_value(self)?])
    }

    fn markdown(&self) -> String;

    fn summary(&self) -> String;
}

/// Render `value` as `format`.
pub fn render<T: Render + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for row in value.jsonl_rows()? {
                out.push_str(&serde_json::to_string(&row)?);
                out.push('\n');
            }
            out.trim_end().to_string()
        }
        OutputFormat::Md => value.markdown(),
        OutputFormat::Summary => value.summary(),
    })
}

fn rows_of<T: Serialize>(items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(Into::into))
        .collect()
}

/// Borrowed record set.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RecordSet<'a>(pub &'a [LifetimeRecord]);

impl Render for RecordSet<'_> {
    fn jsonl_rows(&self) -> Result<Vec<Value>> {
        rows_of(self.0)
    }

    fn markdown(&self) -> String {
        let mut out = String::from(
            "| Device | Test | Temp (°C) | Volt (V) | Hours | Censored | Batch |\n\
             |---|---|---:|---:|---:|:---:|---|\n",
        );
        for r in self.0 {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {:.2} | {} | {} |",
                r.device_id,
                r.test_type,
                r.stress_temperature_c,
                r.stress_voltage_v,
                r.observed_hours,
                if r.censored { "yes" } else { "no" },
                r.batch_id
            );
        }
        out
    }

    fn summary(&self) -> String {
        let censored = self.0.iter().filter(|r| r.censored).count();
        format!(
            "{} records, {} failures, {} censored",
            self.0.len(),
            self.0.len() - censored,
            censored
        )
    }
}

fn fit_tables(report: &FitReport, out: &mut String) {
    out.push_str(
        "| Cell | n | Failures | Censored | β | η (h) | MTTF (h) | Hazard |\n\
         |---|---:|---:|---:|---:|---:|---:|---|\n",
    );
    for fit in &report.fits {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {:.3} | {:.1} | {:.1} | {} |",
            fit.cell,
            fit.n_total,
            fit.n_failures,
            fit.n_censored,
            fit.shape,
            fit.scale,
            fit.mttf_hours,
            fit.hazard.interpretation()
        );
    }
    if !report.skipped.is_empty() {
        out.push_str("\n**Skipped cells**\n\n| Cell | n | Failures | Reason |\n|---|---:|---:|---|\n");
        for outcome in report.outcomes() {
            if let CellOutcome::InsufficientData(skip) | CellOutcome::FitFailed(skip) = outcome {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    skip.cell, skip.n_total, skip.n_failures, skip.reason
                );
            }
        }
    }
}

impl Render for FitReport {
    fn jsonl_rows(&self) -> Result<Vec<Value>> {
        let mut rows = Vec::with_capacity(self.cell_count());
        for outcome in self.outcomes() {
            let mut row = match outcome {
                CellOutcome::Fitted(fit) => serde_json::to_value(fit)?,
                CellOutcome::InsufficientData(skip) | CellOutcome::FitFailed(skip) => {
                    serde_json::to_value(skip)?
                }
            };
            if let Value::Object(map) = &mut row {
                map.insert("outcome".to_string(), Value::from(outcome.label()));
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn markdown(&self) -> String {
        let mut out = String::from("# Weibull fits\n\n");
        fit_tables(self, &mut out);
        out
    }

    fn summary(&self) -> String {
        format!(
            "{} cells: {} fitted, {} skipped",
            self.cell_count(),
            self.fits.len(),
            self.skipped.len()
        )
    }
}

fn arrhenius_table(reg: &ArrheniusRegression, out: &mut String) {
    let c = &reg.coefficients;
    let _ = writeln!(out, "ln(η) = {:.3} + {:.4e}·(1/T)\n", c.intercept, c.slope);
    out.push_str("| Test | a | b (K) | R² | Ea (eV) | Points | Temps |\n|---|---:|---:|---:|---:|---:|---:|\n");
    let _ = writeln!(
        out,
        "| {} | {:.4} | {:.1} | {:.4} | {:.3} | {} | {} |",
        c.test_type,
        c.intercept,
        c.slope,
        c.r_squared,
        c.activation_energy_ev,
        c.n_points,
        c.n_temperatures
    );
}

impl Render for ArrheniusRegression {
    fn markdown(&self) -> String {
        let mut out = format!("# Arrhenius check: {}\n\n", self.coefficients.test_type);
        arrhenius_table(self, &mut out);
        out
    }

    fn summary(&self) -> String {
        let c = &self.coefficients;
        format!(
            "{} Arrhenius: a={:.3} b={:.1} R²={:.4} Ea={:.3} eV",
            c.test_type, c.intercept, c.slope, c.r_squared, c.activation_energy_ev
        )
    }
}

fn survival_table(curves: &[KmCurve], out: &mut String) {
    out.push_str("| Group | n | Failures | S(end) | Median (h) |\n|---|---:|---:|---:|---:|\n");
    for curve in curves {
        let failures: usize = curve.steps.iter().map(|s| s.events).sum();
        let end = curve.steps.last().map_or(1.0, |s| s.survival);
        let median = curve
            .median_survival()
            .map_or_else(|| "-".to_string(), |m| format!("{:.1}", m));
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.3} | {} |",
            curve.label(),
            curve.n_total,
            failures,
            end,
            median
        );
    }
}

impl Render for PipelineOutput {
    fn jsonl_rows(&self) -> Result<Vec<Value>> {
        self.fit.jsonl_rows()
    }

    fn markdown(&self) -> String {
        let mut out = format!("# Accelerated life test: {}\n\n", self.run_id);
        if let Some(seed) = self.seed {
            let _ = writeln!(out, "Seed {}, {} devices.\n", seed, self.records.len());
        }
        out.push_str("## Weibull fits\n\n");
        fit_tables(&self.fit, &mut out);
        out.push_str("\n## Arrhenius\n\n");
        match &self.arrhenius {
            Some(reg) => arrhenius_table(reg, &mut out),
            None => out.push_str("Not available.\n"),
        }
        out.push_str("\n## Survival\n\n");
        survival_table(&self.survival, &mut out);
        if let Some(plot) = &self.probability_plot {
            let _ = writeln!(
                out,
                "\n## Probability plot\n\n{}: {} failures, β = {:.3}, η = {:.1} h",
                plot.cell,
                plot.points.len(),
                plot.shape,
                plot.scale
            );
        }
        if !self.notes.is_empty() {
            out.push_str("\n## Notes\n\n");
            for note in &self.notes {
                let _ = writeln!(out, "- {}", note);
            }
        }
        out
    }

    fn summary(&self) -> String {
        let mut line = format!("[{}] {}; {}", self.run_id, RecordSet(&self.records).summary(), self.fit.summary());
        if let Some(reg) = &self.arrhenius {
            let _ = write!(line, "; Ea={:.3} eV", reg.coefficients.activation_energy_ev);
        }
        line
    }
}

/// Catalog listing.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CatalogView<'a>(pub &'a Catalog);

impl Render for CatalogView<'_> {
    fn jsonl_rows(&self) -> Result<Vec<Value>> {
        rows_of(self.0.entries())
    }

    fn markdown(&self) -> String {
        let mut out = String::from(
            "| Test | Temperatures (°C) | Voltages (V) | End (h) | β |\n|---|---|---|---:|---:|\n",
        );
        for entry in self.0.entries() {
            let join = |xs: &[f64]| {
                xs.iter()
                    .map(|x| x.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                entry.test_type,
                join(&entry.temperatures_c),
                join(&entry.voltages_v),
                entry.test_end_hours,
                entry.shape
            );
        }
        out
    }

    fn summary(&self) -> String {
        format!(
            "{} test types, {} stress cells",
            self.0.len(),
            self.0.cells().len()
        )
    }
}
