use crate::field::FieldValue;
use crate::formatter::Formatter;
use crate::linking::TracingContext;
use crate::record::{Caller, LogEntry};
use crate::sink::LogSink;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Where the layer finds the tracing context of the current call.
///
/// Supplied by the tracing agent, typically backed by its notion of the
/// current transaction. Queried once per event and never cached.
pub trait ContextSource: Send + Sync {
    fn current(&self) -> Option<Arc<dyn TracingContext>>;
}

impl<F> ContextSource for F
where
    F: Fn() -> Option<Arc<dyn TracingContext>> + Send + Sync,
{
    fn current(&self) -> Option<Arc<dyn TracingContext>> {
        self()
    }
}

/// `tracing_subscriber` layer that renders every event as a flat JSON
/// record, linked to the transaction active at call time, and writes it to
/// a [`LogSink`].
///
/// The whole pipeline runs synchronously on the calling thread. Failures
/// drop the record and are counted; they never reach the application.
pub struct LinkingLayer {
    formatter: Formatter,
    sink: Arc<dyn LogSink>,
    context_source: Option<Arc<dyn ContextSource>>,
    max_level: LevelFilter,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Records handed to the sink.
    pub emitted_records: Arc<AtomicU64>,
    /// Records lost to a serialization or sink failure.
    pub dropped_records: Arc<AtomicU64>,
}

impl LinkingLayer {
    /// Create a layer writing to `sink`. Without a context source no
    /// record carries linking fields.
    pub fn new(sink: Arc<dyn LogSink>, formatter: Formatter) -> Self {
        Self {
            formatter,
            sink,
            context_source: None,
            max_level: LevelFilter::TRACE,
            total_events: Arc::new(AtomicU64::new(0)),
            emitted_records: Arc::new(AtomicU64::new(0)),
            dropped_records: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_context_source(mut self, source: impl ContextSource + 'static) -> Self {
        self.context_source = Some(Arc::new(source));
        self
    }

    /// Ignore events more verbose than `level`.
    pub fn with_max_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.max_level = level.into();
        self
    }
}

/// Build a [`LogEntry`] from a `tracing` event. The module path stands in
/// for the method name, since call-site metadata has no function name.
pub(crate) fn entry_from_event(event: &Event<'_>) -> LogEntry {
    let mut fields = BTreeMap::new();
    let mut message: Option<String> = None;

    let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
    event.record(&mut visitor);

    let meta = event.metadata();
    LogEntry {
        timestamp: Utc::now(),
        level: *meta.level(),
        message: message.unwrap_or_default(),
        caller: Some(Caller {
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
            method: Some(meta.module_path().unwrap_or_else(|| meta.target()).to_string()),
        }),
        fields,
    }
}

impl<S> Layer<S> for LinkingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if *event.metadata().level() > self.max_level {
            return;
        }

        let entry = entry_from_event(event);
        let context = self.context_source.as_ref().and_then(|source| source.current());

        // Never log through `tracing` from here: it would re-enter this layer.
        match self.formatter.write(&entry, context.as_deref(), &*self.sink) {
            Ok(()) => {
                self.emitted_records.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.dropped_records.fetch_add(1, Ordering::Relaxed);
                eprintln!("dropping log record: {}", e);
            }
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, FieldValue>,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.insert(field, FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_i128(&mut self, field: &Field, value: i128) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_u128(&mut self, field: &Field, value: u128) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, FieldValue::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, FieldValue::error(value));
    }

    // `message` arrives here as `format_args!`, whose debug text is the
    // formatted message itself.
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, FieldValue::Opaque(format!("{:?}", value)));
        }
    }
}
