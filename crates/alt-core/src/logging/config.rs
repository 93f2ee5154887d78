//! Logging configuration.
//!
//! Resolution order, later wins: defaults, `RUST_LOG` (level only),
//! `ALT_LOG`, `ALT_LOG_FORMAT` / `ALT_LOG_TIMESTAMPS`, then CLI flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where log lines go and how they look. Always stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event, for batch pipelines.
    Jsonl,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format '{}' (expected human or jsonl)", s)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum level written.
///
/// `Info` shows stage progress, `Debug` adds one line per stress cell,
/// `Warn` keeps only skipped cells and clamped draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Level implied by repeated `-v` / `-q` flags; `None` when neither is given.
    /// Quiet wins over verbose.
    pub fn from_verbosity(verbose: u8, quiet: u8) -> Option<LogLevel> {
        match (verbose, quiet) {
            (0, 0) => None,
            (_, q) if q >= 2 => Some(LogLevel::Off),
            (_, 1) => Some(LogLevel::Warn),
            (1, _) => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }

    /// Most verbose level mentioned anywhere in a `RUST_LOG` directive string.
    fn from_rust_log(directives: &str) -> Option<LogLevel> {
        let lower = directives.to_ascii_lowercase();
        LogLevel::ALL[..5]
            .iter()
            .copied()
            .find(|level| lower.contains(level.as_str()))
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "warning" => Ok(LogLevel::Warn),
            "none" | "quiet" => Ok(LogLevel::Off),
            other => LogLevel::ALL
                .iter()
                .copied()
                .find(|level| level.as_str() == other)
                .ok_or_else(|| format!("unknown log level: {}", s)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Timestamps in human output. JSONL lines always carry `ts`.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_level = lookup("ALT_LOG")
            .and_then(|v| v.parse().ok())
            .or_else(|| lookup("RUST_LOG").and_then(|v| LogLevel::from_rust_log(&v)));
        let env_format = lookup("ALT_LOG_FORMAT").and_then(|v| v.parse().ok());
        let timestamps = lookup("ALT_LOG_TIMESTAMPS")
            .map(|v| !matches!(v.trim(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        let defaults = LogConfig::default();
        LogConfig {
            format: cli_format.or(env_format).unwrap_or(defaults.format),
            level: cli_level.or(env_level).unwrap_or(defaults.level),
            timestamps,
        }
    }
}
