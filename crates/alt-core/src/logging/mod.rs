//! Structured logging foundation for alt-core.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for batch pipelines
//!
//! # Usage
//!
//! ```ignore
//! use alt_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::new(generate_run_id());
//! log_event!(ctx, INFO, event_names::GENERATE_STARTED, Stage::Generate, "generating", seed = 2025u64);
//! ```
//!
//! stdout is reserved for command payloads; all log output goes to stderr.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Install the global subscriber. Later calls are no-ops.
///
/// Event targets are event names rather than module paths, so the filter is
/// a bare level.
pub fn init_logging(config: &LogConfig) {
    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Jsonl => Box::new(JsonlLayer::stderr()),
        LogFormat::Human => {
            let human = fmt::layer::<Registry>()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                Box::new(human)
            } else {
                Box::new(human.without_time())
            }
        }
    };

    let _ = tracing_subscriber::registry()
        .with(output)
        .with(EnvFilter::new(config.level.to_string()))
        .try_init();
}

/// Fresh run ID: `run-` plus 12 hex digits of a v4 UUID.
pub fn generate_run_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &hex[..12])
}

/// Emit a tracing event stamped with the context's run ID and a stage.
///
/// The level is one of `TRACE`, `DEBUG`, `INFO`, `WARN`, `ERROR`; the event
/// name must be a constant since it becomes the tracing target.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::FIT_STARTED, Stage::Fit, "fitting cells", cells = 5usize);
/// log_event!(ctx, WARN, event_names::FIT_CELL_SKIPPED, Stage::Fit, "cell skipped",
///     cell = tracing::field::display(&cell));
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, $level:ident, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)* $(,)?) => {
        tracing::event!(
            target: $event,
            tracing::Level::$level,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();

        assert!(id1.starts_with("run-"));
        assert_ne!(id1, id2);
        // Format: run-<12 hex chars>
        assert_eq!(id1.len(), 16);
        assert!(id1[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Human);
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.timestamps);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(&LogConfig::default());
        init_logging(&LogConfig {
            format: LogFormat::Jsonl,
            level: LogLevel::Off,
            timestamps: false,
        });
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }
}
