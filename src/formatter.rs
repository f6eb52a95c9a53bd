use crate::env::{env_or, LOG_LINKER_STYLE_ENV};
use crate::linking::{link, HostResolver, SystemHostname, TracingContext};
use crate::record::{assemble, LogEntry, LogRecord};
use crate::sink::LogSink;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Layout of the emitted JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// One line, no insignificant whitespace.
    #[default]
    Compact,
    /// Indented, one key per line.
    Pretty,
}

/// Immutable formatter settings, shared by every caller.
///
/// **Fields**
/// - `style`: [`OutputStyle`] of the JSON object.
/// - `line_terminated`: if `true`, a single `\n` follows every record
///   written to a sink. [`Formatter::emit`] never adds it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub style: OutputStyle,
    pub line_terminated: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            style: OutputStyle::Compact,
            line_terminated: true,
        }
    }
}

impl FormatterConfig {
    /// Defaults, with the style taken from `LOG_LINKER_STYLE` when it names
    /// a known style.
    pub fn from_env() -> Self {
        let style = match env_or(LOG_LINKER_STYLE_ENV, "compact").to_ascii_lowercase().as_str() {
            "pretty" => OutputStyle::Pretty,
            _ => OutputStyle::Compact,
        };
        Self {
            style,
            ..Self::default()
        }
    }
}

/// Error returned when a single record could not be emitted.
///
/// Scoped to that record: callers drop it and carry on.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write log record: {0}")]
    Sink(#[from] std::io::Error),
}

/// Turns log entries into linked JSON records.
///
/// Holds only configuration; every call derives linking metadata from the
/// context it is given, so one formatter can serve any number of threads
/// and the same [`LogEntry`] can be formatted against different contexts.
#[derive(Clone)]
pub struct Formatter {
    config: FormatterConfig,
    resolver: Arc<dyn HostResolver>,
}

impl Formatter {
    pub fn new(config: FormatterConfig) -> Self {
        Formatter {
            config,
            resolver: Arc::new(SystemHostname::new()),
        }
    }

    /// Replace the host name lookup used when the agent reports none.
    pub fn with_host_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Render an assembled record as a single JSON object.
    pub fn emit(&self, record: &LogRecord) -> Result<Vec<u8>, FormatError> {
        let bytes = match self.config.style {
            OutputStyle::Compact => serde_json::to_vec(record)?,
            OutputStyle::Pretty => serde_json::to_vec_pretty(record)?,
        };
        Ok(bytes)
    }

    /// Link, assemble and emit one entry, including the line terminator
    /// when configured.
    pub fn format(
        &self,
        entry: &LogEntry,
        context: Option<&dyn TracingContext>,
    ) -> Result<Vec<u8>, FormatError> {
        let linking = link(context, &*self.resolver);
        let record = assemble(entry, linking.as_ref());
        let mut bytes = self.emit(&record)?;
        if self.config.line_terminated {
            bytes.push(b'\n');
        }
        Ok(bytes)
    }

    /// Format one entry and hand it to `sink`.
    ///
    /// On error nothing has been written for this entry, or the sink
    /// rejected it; either way the record is lost and nothing is retried.
    pub fn write(
        &self,
        entry: &LogEntry,
        context: Option<&dyn TracingContext>,
        sink: &dyn LogSink,
    ) -> Result<(), FormatError> {
        let bytes = self.format(entry, context)?;
        sink.write_record(&bytes)?;
        Ok(())
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(FormatterConfig::default())
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
