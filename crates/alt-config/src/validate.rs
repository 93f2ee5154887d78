//! Configuration validation errors and semantic validation.

use crate::catalog::{Catalog, TestTypeConfig};
use crate::study::{FitOptions, GeneratorConfig, StudyConfig};
use alt_common::KELVIN_OFFSET;
use std::collections::HashSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 12,
            ValidationError::SemanticError(_) => 13,
            ValidationError::InvalidValue { .. } => 11,
            ValidationError::VersionMismatch { .. } => 14,
        }
    }

    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for alt_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidValue { field, message } => {
                alt_common::Error::InvalidConfigValue { field, message }
            }
            ValidationError::IoError(msg) => {
                alt_common::Error::Io(std::io::Error::other(msg))
            }
            other => alt_common::Error::Config(other.to_string()),
        }
    }
}

/// Validate a complete study configuration semantically.
pub fn validate_study(study: &StudyConfig) -> ValidationResult<()> {
    if study.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: study.schema_version.clone(),
        });
    }

    validate_generator(&study.generator)?;
    validate_catalog(&study.catalog)?;
    validate_fit_options(&study.fit)?;

    if study.catalog.get(study.arrhenius_test_type).is_none() {
        return Err(ValidationError::invalid(
            "arrhenius_test_type",
            format!("{} is not in the catalog", study.arrhenius_test_type),
        ));
    }

    if !study.catalog.contains_cell(&study.probability_plot_cell) {
        return Err(ValidationError::invalid(
            "probability_plot_cell",
            format!("{} is not scheduled by the catalog", study.probability_plot_cell),
        ));
    }

    Ok(())
}

/// Validate generator parameters.
pub fn validate_generator(cfg: &GeneratorConfig) -> ValidationResult<()> {
    if cfg.n_per_group == 0 {
        return Err(ValidationError::invalid(
            "generator.n_per_group",
            "Must be at least 1",
        ));
    }
    // Device IDs are u32 and run across the whole study.
    if cfg.n_per_group > u32::MAX as usize / 1024 {
        return Err(ValidationError::invalid(
            "generator.n_per_group",
            format!("Too large: {}", cfg.n_per_group),
        ));
    }

    check_positive("generator.ea_ev", cfg.ea_ev)?;
    check_positive("generator.t_ref_k", cfg.t_ref_k)?;
    check_positive("generator.eta_ref", cfg.eta_ref)?;
    check_non_negative("generator.batch_sigma", cfg.batch_sigma)?;
    check_non_negative("generator.device_sigma", cfg.device_sigma)?;

    if cfg.batches.is_empty() {
        return Err(ValidationError::invalid(
            "generator.batches",
            "At least one batch is required",
        ));
    }
    let mut seen = HashSet::new();
    for batch in &cfg.batches {
        if batch.as_str().trim().is_empty() {
            return Err(ValidationError::invalid(
                "generator.batches",
                "Batch labels must not be empty",
            ));
        }
        if !seen.insert(batch.as_str()) {
            return Err(ValidationError::invalid(
                "generator.batches",
                format!("Duplicate batch label {}", batch),
            ));
        }
    }

    Ok(())
}

/// Validate the test-type catalog.
pub fn validate_catalog(catalog: &Catalog) -> ValidationResult<()> {
    if catalog.is_empty() {
        return Err(ValidationError::SemanticError(
            "Catalog must contain at least one test type".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in catalog.entries() {
        if !seen.insert(entry.test_type) {
            return Err(ValidationError::SemanticError(format!(
                "Test type {} appears more than once in the catalog",
                entry.test_type
            )));
        }
        validate_entry(entry)?;
    }

    Ok(())
}

fn validate_entry(entry: &TestTypeConfig) -> ValidationResult<()> {
    let prefix = format!("catalog.{}", entry.test_type);

    if entry.temperatures_c.is_empty() {
        return Err(ValidationError::invalid(
            format!("{prefix}.temperatures_c"),
            "At least one temperature is required",
        ));
    }
    for &t in &entry.temperatures_c {
        if !t.is_finite() || t <= -KELVIN_OFFSET {
            return Err(ValidationError::invalid(
                format!("{prefix}.temperatures_c"),
                format!("Must be finite and above absolute zero, got {}", t),
            ));
        }
    }
    check_levels(&format!("{prefix}.temperatures_c"), &entry.temperatures_c)?;

    if entry.voltages_v.is_empty() {
        return Err(ValidationError::invalid(
            format!("{prefix}.voltages_v"),
            "At least one voltage is required",
        ));
    }
    for &v in &entry.voltages_v {
        if !v.is_finite() || v < 0.0 {
            return Err(ValidationError::invalid(
                format!("{prefix}.voltages_v"),
                format!("Must be finite and non-negative, got {}", v),
            ));
        }
    }
    check_levels(&format!("{prefix}.voltages_v"), &entry.voltages_v)?;

    // JSON has no infinity, so an open-ended end time would not survive export.
    check_positive(&format!("{prefix}.test_end_hours"), entry.test_end_hours)?;
    check_positive(&format!("{prefix}.shape"), entry.shape)?;

    Ok(())
}

/// Stress levels of one axis must be distinct, and `-0.0` is refused because
/// cell keys compare bit patterns and would treat it apart from `0.0`.
fn check_levels(field: &str, levels: &[f64]) -> ValidationResult<()> {
    if let Some(&z) = levels.iter().find(|v| **v == 0.0 && v.is_sign_negative()) {
        return Err(ValidationError::invalid(
            field,
            format!("Negative zero is not a stress level, got {}", z),
        ));
    }
    let mut sorted = levels.to_vec();
    sorted.sort_by(f64::total_cmp);
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(ValidationError::invalid(
            field,
            format!("Duplicate stress level {}", pair[0]),
        ));
    }
    Ok(())
}

/// Validate fitter options.
pub fn validate_fit_options(fit: &FitOptions) -> ValidationResult<()> {
    if fit.min_fails == 0 {
        return Err(ValidationError::invalid("fit.min_fails", "Must be at least 1"));
    }
    if fit.max_iterations == 0 {
        return Err(ValidationError::invalid(
            "fit.max_iterations",
            "Must be at least 1",
        ));
    }
    check_positive("fit.tolerance", fit.tolerance)?;
    Ok(())
}

fn check_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::invalid(
            field,
            format!("Must be positive and finite, got {}", value),
        ));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::invalid(
            field,
            format!("Must be non-negative and finite, got {}", value),
        ));
    }
    Ok(())
}
