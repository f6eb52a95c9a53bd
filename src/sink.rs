use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Destination for rendered log records, supplied by the caller.
///
/// Implementations own their concurrency discipline: the pipeline may call
/// `write_record` from many threads at once and never locks around it.
/// Each call carries exactly one complete record.
pub trait LogSink: Send + Sync {
    /// Write one rendered record.
    ///
    /// **Returns**
    /// - `Ok(())` if the bytes were handed to the destination.
    /// - `Err(..)` if the destination failed. The record is dropped; the
    ///   pipeline never retries.
    fn write_record(&self, bytes: &[u8]) -> io::Result<()>;

    /// Flush any buffered records, if the destination buffers.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn write_record(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_record(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Sink over any [`MakeWriter`], e.g. `std::io::stdout` or a
/// `tracing_appender` non-blocking writer.
///
/// A fresh writer is made per record and the record is written with a
/// single `write_all`.
#[derive(Clone, Debug)]
pub struct WriterSink<M> {
    make_writer: M,
}

impl<M> WriterSink<M> {
    pub fn new(make_writer: M) -> Self {
        WriterSink { make_writer }
    }
}

impl<M> LogSink for WriterSink<M>
where
    M: for<'a> MakeWriter<'a> + Send + Sync,
{
    fn write_record(&self, bytes: &[u8]) -> io::Result<()> {
        self.make_writer.make_writer().write_all(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        self.make_writer.make_writer().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuf {
        type Writer = SharedBuf;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn writer_sink_appends_each_record() {
        let buf = SharedBuf::default();
        let sink: Arc<dyn LogSink> = Arc::new(WriterSink::new(buf.clone()));
        sink.write_record(b"{\"a\":1}\n").unwrap();
        sink.write_record(b"{\"b\":2}\n").unwrap();
        sink.flush().unwrap();
        assert_eq!(&*buf.0.lock().unwrap(), b"{\"a\":1}\n{\"b\":2}\n");
    }
}
