//! JSONL tracing layer.
//!
//! Each event becomes one JSON object on the writer (stderr in the binary).
//! `run_id` and `stage` are lifted to the top level, taken from the event
//! itself or from the nearest enclosing span that recorded them.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Fields gathered from an event or span, with the envelope keys split out.
#[derive(Debug, Clone, Default)]
struct Collected {
    run_id: Option<String>,
    stage: Option<String>,
    message: Option<String>,
    fields: Map<String, Value>,
}

impl Collected {
    fn put(&mut self, field: &Field, value: Value) {
        let slot = match field.name() {
            "run_id" => &mut self.run_id,
            "stage" => &mut self.stage,
            "message" => &mut self.message,
            name => {
                self.fields.insert(name.to_string(), value);
                return;
            }
        };
        *slot = Some(match value {
            Value::String(s) => s,
            other => other.to_string(),
        });
    }

    /// Fill missing envelope keys from an enclosing span.
    fn inherit(&mut self, span: &Collected) {
        if self.run_id.is_none() {
            self.run_id.clone_from(&span.run_id);
        }
        if self.stage.is_none() {
            self.stage.clone_from(&span.stage);
        }
    }
}

impl Visit for Collected {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::from(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form
        let v = Number::from_f64(value).map_or_else(|| Value::from(value.to_string()), Value::Number);
        self.put(field, v);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }
}

/// One output line.
#[derive(Serialize)]
struct LogLine<'a> {
    ts: DateTime<Utc>,
    level: Level,
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    fields: Map<String, Value>,
}

/// Tracing layer writing one JSON object per event.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut collected = Collected::default();
        attrs.record(&mut collected);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(collected);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut collected = Collected::default();
        event.record(&mut collected);
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(outer) = span.extensions().get::<Collected>() {
                    collected.inherit(outer);
                }
            }
        }

        let line = LogLine {
            ts: Utc::now(),
            level: (*event.metadata().level()).into(),
            event: event.metadata().target(),
            run_id: collected.run_id,
            stage: collected.stage,
            message: collected.message,
            fields: collected.fields,
        };
        let Ok(json) = serde_json::to_string(&line) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}
