//! Process exit codes for the alt-core CLI.
//!
//! | Code | Meaning |
//! |---:|---|
//! | 0 | every stress cell was fitted |
//! | 1 | payload complete, some cells skipped |
//! | 10 | bad arguments or malformed input records |
//! | 11 | configuration missing, unparseable or invalid |
//! | 20 | internal error |
//! | 21 | I/O or storage failure |
//!
//! Codes below 10 mean stdout holds a complete payload. Code 20 is only
//! produced by the hook from [`install_panic_hook`].

use crate::logging::event_names;
use alt_common::{Error, ErrorCategory};
use std::any::Any;
use std::fmt;

/// Stable exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Clean = 0,
    PartialSkip = 1,
    ArgsError = 10,
    ConfigError = 11,
    /// A bug; nothing the user can fix.
    InternalError = 20,
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Whether stdout carries a complete payload.
    pub fn has_payload(self) -> bool {
        self.as_i32() < 10
    }

    /// Machine name used in structured output, e.g. `ERR_CONFIG`.
    pub fn code_name(self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PartialSkip => "OK_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Outcome of a fit that ran to completion with `skipped` cells left out.
    pub fn from_skipped(skipped: usize) -> ExitCode {
        match skipped {
            0 => ExitCode::Clean,
            _ => ExitCode::PartialSkip,
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            // model errors only arise from study parameters
            ErrorCategory::Config | ErrorCategory::Model => ExitCode::ConfigError,
            ErrorCategory::Input => ExitCode::ArgsError,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

/// Report panics as [`ExitCode::InternalError`] and exit.
///
/// Release builds abort on panic, so the hook is where the exit code is chosen.
pub fn install_panic_hook(machine: bool) {
    std::panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line()));
        tracing::error!(
            target: event_names::INTERNAL_ERROR,
            location = location.as_deref().unwrap_or("unknown"),
            exit_code = ExitCode::InternalError.as_i32(),
            "panic: {}",
            message
        );
        eprintln!("{}", internal_error_report(&message, location.as_deref(), machine));
        std::process::exit(ExitCode::InternalError.as_i32());
    }));
}

/// Text of a panic payload. `panic!` carries a `&str` or a `String`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn internal_error_report(message: &str, location: Option<&str>, machine: bool) -> String {
    let code = ExitCode::InternalError;
    if machine {
        serde_json::json!({
            "code": code.as_i32(),
            "error": code.code_name(),
            "message": message,
            "location": location,
        })
        .to_string()
    } else {
        format!(
            "✗ Internal error\n  Reason: {} ({})\n  Fix: this is a bug in alt-core; rerun with -vv and report it",
            message,
            location.unwrap_or("unknown location")
        )
    }
}
