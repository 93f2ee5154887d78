//! Event vocabulary shared by tracing output and `events.jsonl`.
//!
//! Every event has a dotted name (`fit.cell_skipped`), the run it belongs to
//! and the pipeline [`Stage`] that emitted it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Severity as written to JSONL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Generate,
    Fit,
    Regress,
    Persist,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Generate => "generate",
            Stage::Fit => "fit",
            Stage::Regress => "regress",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event names, used as tracing targets.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const GENERATE_STARTED: &str = "generate.started";
    pub const GENERATE_BATCH_EFFECT: &str = "generate.batch_effect";
    pub const GENERATE_CELL_DONE: &str = "generate.cell_done";
    /// A sampled scale or lifetime was not positive and was clamped.
    pub const GENERATE_DRAW_CLAMPED: &str = "generate.draw_clamped";
    pub const GENERATE_FINISHED: &str = "generate.finished";

    pub const FIT_STARTED: &str = "fit.started";
    pub const FIT_CELL_FITTED: &str = "fit.cell_fitted";
    pub const FIT_CELL_SKIPPED: &str = "fit.cell_skipped";
    pub const FIT_FINISHED: &str = "fit.finished";

    pub const REGRESS_FINISHED: &str = "regress.finished";
    pub const REGRESS_FAILED: &str = "regress.failed";

    pub const PERSIST_TABLE_WRITTEN: &str = "persist.table_written";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// One line of a run's `events.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,
    pub event: String,
    pub run_id: String,
    pub stage: Stage,
    pub message: String,
    /// Extra keys, serialized in sorted order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl LogEvent {
    /// Attach `key`; values that fail to serialize are recorded as null.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.fields.insert(key.into(), value);
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            serde_json::json!({ "event": self.event, "error": err.to_string() }).to_string()
        })
    }
}

/// Stamps events with this invocation's run ID.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }

    pub fn event(&self, level: Level, event: &str, stage: Stage, message: impl Into<String>) -> LogEvent {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.to_string(),
            run_id: self.run_id.clone(),
            stage,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn info(&self, event: &str, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Info, event, stage, message)
    }

    pub fn warn(&self, event: &str, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Warn, event, stage, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_flat_envelope() {
        let line = LogContext::new("run-12345")
            .info(event_names::GENERATE_STARTED, Stage::Generate, "generating lifetimes")
            .with_field("seed", 2025u64)
            .with_field("cells", 7usize)
            .to_jsonl();

        let json: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(json["event"], "generate.started");
        assert_eq!(json["level"], "info");
        assert_eq!(json["stage"], "generate");
        assert_eq!(json["run_id"], "run-12345");
        assert_eq!(json["fields"]["seed"], 2025);
        // sorted keys keep events.jsonl diffable
        assert!(line.find("\"cells\"").unwrap() < line.find("\"seed\"").unwrap());
    }

    #[test]
    fn event_without_fields_omits_map() {
        let ctx = LogContext::new("run-1");
        let line = ctx
            .warn(event_names::FIT_CELL_SKIPPED, Stage::Fit, "skipped")
            .to_jsonl();
        assert!(line.contains(r#""level":"warn""#));
        assert!(!line.contains("fields"));
    }

    #[test]
    fn event_round_trips() {
        let event = LogContext::new("run-9")
            .info(event_names::RUN_FINISHED, Stage::Persist, "done")
            .with_field("skipped", 2usize)
            .with_field("activation_energy_ev", Option::<f64>::None);
        let back: LogEvent = serde_json::from_str(&event.to_jsonl()).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.fields["activation_energy_ev"], Value::Null);
    }

    #[test]
    fn stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Generate,
            Stage::Fit,
            Stage::Regress,
            Stage::Persist,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }
}
