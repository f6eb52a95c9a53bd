use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use tracing_log_linker::formatter::{FormatterConfig, OutputStyle};
use tracing_log_linker::init::{init_tracing_with_config, LayerConfig};
use tracing_log_linker::linking::{TracingContext, TransactionHandle, TransactionLinking};
use tracing_log_linker::noop_sink::NoopSink;
use tracing_subscriber::filter::LevelFilter;

/// Stand-in for an APM agent with one sampled transaction in flight.
struct SampledTransaction;

impl TransactionHandle for SampledTransaction {
    fn linking_metadata(&self) -> TransactionLinking {
        TransactionLinking {
            entity_name: "AppName".to_string(),
            entity_type: "SERVICE".to_string(),
            hostname: None,
            distributed_tracing_enabled: true,
            sampled: true,
            trace_id: "d9466896a525ccbf".to_string(),
            span_sampling_enabled: true,
            span_id: "bcfb32e050b264b8".to_string(),
        }
    }
}

struct Agent(SampledTransaction);

impl TracingContext for Agent {
    fn active_transaction(&self) -> Option<&dyn TransactionHandle> {
        Some(&self.0)
    }
}

/// Load run with an active, sampled transaction: every record carries
/// entity, host, trace and span fields.
fn main() {
    let sink = Arc::new(NoopSink);
    let agent: Arc<dyn TracingContext> = Arc::new(Agent(SampledTransaction));

    let layer_config = LayerConfig {
        formatter: FormatterConfig {
            style: OutputStyle::Compact,
            line_terminated: true,
        },
        max_level: LevelFilter::INFO,
        enable_stdout: false,
    };

    init_tracing_with_config(sink, move || Some(Arc::clone(&agent)), layer_config)
        .expect("install log linking layer");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        info!(iteration = i, "Hello World!");
    }

    let elapsed = start.elapsed();
    println!("sampled transaction: formatted {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
