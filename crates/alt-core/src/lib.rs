//! Accelerated Life Test Core Library
//!
//! This library provides the core functionality of the engine:
//! - Stress acceleration model and synthetic lifetime generation
//! - Censored Weibull maximum-likelihood fitting per stress cell
//! - Arrhenius regression, Kaplan–Meier curves and probability-plot data
//! - The end-to-end study pipeline
//! - Exit codes, structured logging and output rendering for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
