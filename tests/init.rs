use serde_json::Value;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_log_linker::formatter::{FormatterConfig, OutputStyle};
use tracing_log_linker::init::{init_tracing, init_tracing_with_config, InitError, LayerConfig};
use tracing_log_linker::linking::TracingContext;
use tracing_log_linker::noop_sink::NoopSink;
use tracing_log_linker::sink::LogSink;
use tracing_subscriber::filter::LevelFilter;

#[derive(Default)]
struct BufferSink(Mutex<Vec<u8>>);

impl LogSink for BufferSink {
    fn write_record(&self, bytes: &[u8]) -> io::Result<()> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }
}

fn no_context() -> Option<Arc<dyn TracingContext>> {
    None
}

// The global subscriber can be installed once per process, so this file
// holds a single test.
#[test]
fn installs_once_and_rejects_a_second_subscriber() {
    let sink = Arc::new(BufferSink::default());
    let config = LayerConfig {
        formatter: FormatterConfig {
            style: OutputStyle::Compact,
            line_terminated: true,
        },
        max_level: LevelFilter::TRACE,
        enable_stdout: true,
    };
    init_tracing_with_config(sink.clone(), no_context, config).unwrap();

    tracing::info!(zip = "zap", "Hello World!");

    let text = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // Installing the layer must not put records of its own into the sink.
    assert_eq!(lines.len(), 1, "{}", text);
    let record: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["message"], "Hello World!");
    assert_eq!(record["zip"], "zap");
    assert_eq!(record["log.level"], "info");

    let second = init_tracing(Arc::new(NoopSink), no_context);
    assert!(matches!(second, Err(InitError::AlreadyInstalled(_))));
}
