//! Core math modules.

pub mod linear;
pub mod stable;
pub mod weibull;
