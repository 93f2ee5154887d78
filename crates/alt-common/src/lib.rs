//! Accelerated life test common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Device and batch identity types
//! - Test types, stress cells and lifetime records
//! - Weibull fit results, skip reasons and Arrhenius coefficients
//! - The unified error type with stable codes
//! - Output format specifications

pub mod error;
pub mod fit;
pub mod id;
pub mod output;
pub mod physics;
pub mod record;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use fit::{
    ArrheniusCoefficients, ConfidenceBounds, FitError, HazardTrend, SkipReason, SkippedCell,
    WeibullFitResult,
};
pub use id::{BatchId, DeviceId};
pub use output::OutputFormat;
pub use physics::{celsius_to_kelvin, BOLTZMANN_EV_PER_K, KELVIN_OFFSET};
pub use record::{LifetimeRecord, StressCell, TestType};

/// Schema version stamped on every serialized payload.
pub const SCHEMA_VERSION: &str = "1.0.0";
