//! Fuzz target for TOML study configuration parsing.

#![no_main]

use alt_config::{validate_study, StudyConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(study) = StudyConfig::from_toml_str(text) {
            let _ = validate_study(&study);
        }
    }
});
