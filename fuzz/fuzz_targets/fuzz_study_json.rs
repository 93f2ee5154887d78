//! Fuzz target for JSON study configuration parsing.
//!
//! Parsing and validation must reject arbitrary input with an error, never
//! a panic.

#![no_main]

use alt_config::{validate_study, StudyConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(study) = serde_json::from_slice::<StudyConfig>(data) {
        let _ = validate_study(&study);
    }
});
