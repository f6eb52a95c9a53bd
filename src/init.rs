use crate::formatter::{Formatter, FormatterConfig};
use crate::layer::{ContextSource, LinkingLayer};
use crate::sink::LogSink;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the linking layer.
///
/// **Fields**
/// - `formatter`: [`FormatterConfig`] used for every record.
/// - `max_level`: most verbose level the layer renders; events above it
///   are counted and ignored.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added next to [`LinkingLayer`] for human-readable console output.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub formatter: FormatterConfig,
    pub max_level: LevelFilter,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            formatter: FormatterConfig::default(),
            max_level: LevelFilter::TRACE,
            enable_stdout: false,
        }
    }
}

/// Error returned when the global subscriber cannot be installed.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] SetGlobalDefaultError),
}

/// Install a global `tracing` subscriber that renders linked records into
/// `sink`.
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] that receives one rendered
///   record per event.
/// - `context_source`: the tracing agent's view of the current
///   transaction, queried on every event.
/// - `config`: [`LayerConfig`] controlling output style and level.
pub fn init_tracing_with_config(
    sink: Arc<dyn LogSink>,
    context_source: impl ContextSource + 'static,
    config: LayerConfig,
) -> Result<(), InitError> {
    let layer = LinkingLayer::new(sink, Formatter::new(config.formatter))
        .with_context_source(context_source)
        .with_max_level(config.max_level);

    // The two subscriber shapes have different types, so each branch
    // installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

/// Install the linking layer with defaults, taking the output style from
/// the environment (see [`crate::env`]).
pub fn init_tracing(
    sink: Arc<dyn LogSink>,
    context_source: impl ContextSource + 'static,
) -> Result<(), InitError> {
    let config = LayerConfig {
        formatter: FormatterConfig::from_env(),
        ..LayerConfig::default()
    };
    init_tracing_with_config(sink, context_source, config)
}
