use crate::sink::LogSink;
use std::io;

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of the pipeline itself without any
/// I/O, and for tests that only look at the layer counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write_record(&self, _bytes: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
