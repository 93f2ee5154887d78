//! Error types for the accelerated life test engine.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! Per-cell fitting problems are not errors at this level: they are reported
//! as [`crate::SkipReason`] values alongside successful fits. Only contract
//! violations that abort a whole call surface as [`Error`].
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 40,
//!   "category": "input",
//!   "message": "Arrhenius regression for HTOL needs at least 2 distinct temperatures, got 1",
//!   "recoverable": true,
//!   "context": { "test_type": "HTOL", "distinct_temperatures": 1 }
//! }
//! ```

use crate::record::TestType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Study configuration errors (catalog, generator parameters).
    Config,
    /// Acceleration model errors.
    Model,
    /// Malformed caller input (regression or lookup preconditions).
    Input,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value for {field}: {message}")]
    InvalidConfigValue { field: String, message: String },

    // Model errors (30-39)
    #[error("acceleration model error: {0}")]
    Model(String),

    // Malformed input errors (40-49)
    #[error(
        "Arrhenius regression for {test_type} needs at least 2 distinct temperatures, got {distinct}"
    )]
    InsufficientTemperatures { test_type: TestType, distinct: usize },

    #[error("regression input mixes test types: expected {expected}, found {found}")]
    MixedTestTypes { expected: TestType, found: TestType },

    #[error("stress cell not found: {cell}")]
    CellNotFound { cell: String },

    #[error("empty input: {0}")]
    EmptyInput(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 30-39: Model errors
    /// - 40-49: Malformed input errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfigValue { .. } => 11,
            Error::Model(_) => 30,
            Error::InsufficientTemperatures { .. } => 40,
            Error::MixedTestTypes { .. } => 41,
            Error::CellNotFound { .. } => 42,
            Error::EmptyInput(_) => 43,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Storage(_) => 62,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfigValue { .. } => ErrorCategory::Config,
            Error::Model(_) => ErrorCategory::Model,
            Error::InsufficientTemperatures { .. }
            | Error::MixedTestTypes { .. }
            | Error::CellNotFound { .. }
            | Error::EmptyInput(_) => ErrorCategory::Input,
            Error::Io(_) | Error::Json(_) | Error::Storage(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by changing
    /// inputs or retrying.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfigValue { .. } => true,
            Error::Model(_) => true,
            Error::InsufficientTemperatures { .. } => true,
            Error::MixedTestTypes { .. } => true,
            Error::CellNotFound { .. } => true,
            Error::EmptyInput(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => true,
            // A failed Parquet write usually means a broken output directory.
            Error::Storage(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'alt-core check' to validate the study configuration."
            }
            Error::InvalidConfigValue { .. } => {
                "Fix the named field in the study configuration, or remove it to use the default."
            }
            Error::Model(_) => {
                "Check catalog voltages and temperatures; the voltage factor must stay positive."
            }
            Error::InsufficientTemperatures { .. } => {
                "Fit at least two temperature levels for the test type, or lower --min-fails."
            }
            Error::MixedTestTypes { .. } => {
                "Filter fit results to a single test type before running the regression."
            }
            Error::CellNotFound { .. } => {
                "List available cells with 'alt-core fit' and pick one present in the fit table."
            }
            Error::EmptyInput(_) => "Provide at least one lifetime record.",
            Error::Io(_) => {
                "Check that the input file exists and the output directory is writable."
            }
            Error::Json(_) => {
                "Invalid JSON in input. Check syntax with 'jq .' or regenerate the records."
            }
            Error::Storage(_) => {
                "Check disk space and permissions for the output directory."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfigValue { .. } => "Invalid Configuration Value",
            Error::Model(_) => "Acceleration Model Error",
            Error::InsufficientTemperatures { .. } => "Insufficient Temperature Levels",
            Error::MixedTestTypes { .. } => "Mixed Test Types",
            Error::CellNotFound { .. } => "Stress Cell Not Found",
            Error::EmptyInput(_) => "Empty Input",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
            Error::Storage(_) => "Storage Error",
        }
    }

    /// Format for human consumption: headline, reason and fix.
    pub fn to_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidConfigValue { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::InsufficientTemperatures {
                test_type,
                distinct,
            } => {
                context.insert("test_type".to_string(), serde_json::json!(test_type));
                context.insert(
                    "distinct_temperatures".to_string(),
                    serde_json::json!(distinct),
                );
            }
            Error::MixedTestTypes { expected, found } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("found".to_string(), serde_json::json!(found));
            }
            Error::CellNotFound { cell } => {
                context.insert("cell".to_string(), serde_json::json!(cell));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_category_ranges() {
        let errors = vec![
            Error::Config("x".into()),
            Error::InvalidConfigValue {
                field: "catalog.HTOL.shape".into(),
                message: "must be positive".into(),
            },
            Error::Model("x".into()),
            Error::InsufficientTemperatures {
                test_type: TestType::Htol,
                distinct: 1,
            },
            Error::MixedTestTypes {
                expected: TestType::Htol,
                found: TestType::Tc,
            },
            Error::CellNotFound {
                cell: "HTOL 150°C @ 5V".into(),
            },
            Error::EmptyInput("records".into()),
            Error::Storage("disk full".into()),
        ];
        for err in &errors {
            let code = err.code();
            let expected = match err.category() {
                ErrorCategory::Config => 10..20,
                ErrorCategory::Model => 30..40,
                ErrorCategory::Input => 40..50,
                ErrorCategory::Io => 60..70,
            };
            assert!(expected.contains(&code), "{err}: code {code}");
        }
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::InsufficientTemperatures {
            test_type: TestType::Htol,
            distinct: 1,
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 40);
        assert_eq!(structured.category, ErrorCategory::Input);
        assert_eq!(structured.context["test_type"], serde_json::json!("HTOL"));
        assert_eq!(structured.context["distinct_temperatures"], serde_json::json!(1));
        let json = structured.to_json();
        assert!(json.contains("\"category\":\"input\""));
    }

    #[test]
    fn human_format_has_headline_and_fix() {
        let err = Error::CellNotFound {
            cell: "TC 85°C @ 0V".into(),
        };
        let human = err.to_human();
        assert!(human.starts_with("✗ Stress Cell Not Found"));
        assert!(human.contains("Reason: stress cell not found: TC 85°C @ 0V"));
        assert!(human.contains("Fix: "));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert_eq!(err.code(), 60);
        assert_eq!(err.category(), ErrorCategory::Io);
    }
}
