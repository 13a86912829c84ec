use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// A closed span recorded by [`SpanCapture`].
#[derive(Debug, Clone, Serialize)]
pub struct CapturedSpan {
    /// Span name, e.g. `search_scored`.
    pub name: String,
    /// Module path the span was created in.
    pub target: String,
    /// Name of the enclosing span, if any.
    pub parent: Option<String>,
    /// Fields given at creation plus any recorded later, as JSON values.
    pub fields: HashMap<String, Value>,
    /// Wall-clock time from creation to close.
    pub duration: Duration,
}

/// A tracing layer that keeps closed spans in memory.
///
/// Clones share storage, so a test can install one clone in a subscriber and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

impl SpanCapture {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans closed so far, in close order.
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().map(|spans| spans.clone()).unwrap_or_default()
    }

    /// The first closed span with this name.
    pub fn find(&self, name: &str) -> Option<CapturedSpan> {
        self.spans().into_iter().find(|span| span.name == name)
    }

    /// Drop every captured span.
    pub fn clear(&self) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.clear();
        }
    }
}

struct SpanState {
    started: Instant,
    fields: HashMap<String, Value>,
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, Value>);

impl Visit for JsonVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), Value::from(format!("{value:?}")));
    }
}

impl<S> Layer<S> for SpanCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanState { started: Instant::now(), fields: visitor.0 });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(state) = extensions.get_mut::<SpanState>() {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            state.fields.extend(visitor.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let extensions = span.extensions();
        let (duration, fields) = match extensions.get::<SpanState>() {
            Some(state) => (state.started.elapsed(), state.fields.clone()),
            None => (Duration::ZERO, HashMap::new()),
        };

        let captured = CapturedSpan {
            name: span.name().to_string(),
            target: span.metadata().target().to_string(),
            parent: span.parent().map(|parent| parent.name().to_string()),
            fields,
            duration,
        };
        if let Ok(mut spans) = self.spans.lock() {
            spans.push(captured);
        }
    }
}
