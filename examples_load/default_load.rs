use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use tracing_log_linker::init::init_tracing;
use tracing_log_linker::linking::TracingContext;
use tracing_log_linker::noop_sink::NoopSink;

/// Load run without any transaction: base and caller fields only.
fn main() {
    let sink = Arc::new(NoopSink);
    init_tracing(sink, || -> Option<Arc<dyn TracingContext>> { None })
        .expect("install log linking layer");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        info!(iteration = i, "Hello World!");
    }

    let elapsed = start.elapsed();
    println!("no transaction: formatted {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
