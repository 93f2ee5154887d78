//! Study configuration types.
//!
//! Every section has a complete default, so an empty file (or no file at all)
//! describes the reference HTOL/THB/TC study.

use crate::catalog::Catalog;
use crate::validate::{ValidationError, ValidationResult};
use alt_common::{BatchId, StressCell, TestType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete study configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub schema_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Test type whose fitted scales feed the Arrhenius regression.
    pub arrhenius_test_type: TestType,

    pub generator: GeneratorConfig,

    pub catalog: Catalog,

    pub fit: FitOptions,

    /// Stress cell whose probability-plot coordinates the pipeline reports.
    pub probability_plot_cell: StressCell,
}

impl Default for StudyConfig {
    fn default() -> Self {
        StudyConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            arrhenius_test_type: TestType::Htol,
            generator: GeneratorConfig::default(),
            catalog: Catalog::default(),
            fit: FitOptions::default(),
            probability_plot_cell: StressCell::new(TestType::Htol, 150.0, 5.0),
        }
    }
}

impl StudyConfig {
    /// Load a study from disk. `.toml` files are parsed as TOML, everything
    /// else as JSON.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse a study from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse a study from a TOML string.
    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> ValidationResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("TOML encode failed: {}", e)))
    }
}

/// Parameters of the synthetic generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seed for the run's single owned RNG.
    pub seed: u64,

    /// Devices per stress cell.
    pub n_per_group: usize,

    /// Activation energy in eV.
    pub ea_ev: f64,

    /// Reference temperature in kelvin where the Arrhenius factor is 1.
    pub t_ref_k: f64,

    /// Characteristic life at reference conditions, in hours.
    pub eta_ref: f64,

    /// Manufacturing batches devices are drawn from.
    pub batches: Vec<BatchId>,

    /// Standard deviation of the multiplicative per-batch effect.
    pub batch_sigma: f64,

    /// Standard deviation of the multiplicative per-device noise.
    pub device_sigma: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            seed: 2025,
            n_per_group: 80,
            ea_ev: 0.6,
            t_ref_k: 398.15,
            eta_ref: 1200.0,
            batches: ["B1", "B2", "B3", "B4"].into_iter().map(BatchId::from).collect(),
            batch_sigma: 0.08,
            device_sigma: 0.06,
        }
    }
}

/// Options for the censored Weibull fitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Minimum observed failures for a cell to be fitted.
    pub min_fails: usize,

    /// Newton iteration cap per cell.
    pub max_iterations: usize,

    /// Relative convergence tolerance on the shape parameter.
    pub tolerance: f64,

    /// Fit cells on the rayon thread pool.
    pub parallel: bool,

    /// Compute 95% Wald bounds on shape and scale.
    pub confidence_bounds: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            min_fails: 5,
            max_iterations: 200,
            tolerance: 1e-10,
            parallel: false,
            confidence_bounds: true,
        }
    }
}
