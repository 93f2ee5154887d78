//! Accelerated life test study configuration.
//!
//! This crate provides:
//! - Typed Rust structs for the study file (generator, catalog, fitter options)
//! - JSON and TOML loading
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation with field paths

pub mod catalog;
pub mod resolve;
pub mod study;
pub mod validate;

pub use catalog::{Catalog, TestTypeConfig};
pub use resolve::{load_study, resolve_config, ConfigPaths, ConfigSource};
pub use study::{FitOptions, GeneratorConfig, StudyConfig};
pub use validate::{validate_study, ValidationError, ValidationResult};

/// Schema version for study configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
