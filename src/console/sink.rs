use super::format::{SkipFields, render};
use crate::diagnostics::Diagnostics;
use crate::domain::{LogRecord, TransportError};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

/// Synchronous sink writing one rendered record per call.
///
/// The writer sits behind a lock so records from concurrent callers never
/// interleave within a line.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Render and write `record`, returning any I/O failure as a formatting error.
    pub fn write_record(
        &self,
        record: &LogRecord,
        skip: &SkipFields,
        color: bool,
    ) -> Result<(), TransportError> {
        let mut line = render(record, skip, color);
        line.push('\n');

        let mut out = self.out.lock();
        out.write_all(line.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| TransportError::Formatting(format!("Failed to write console line: {e}")))
    }

    /// Same as [`write_record`](Self::write_record) but failures, panics
    /// included, go to `diagnostics` instead of the caller.
    pub fn write_console(
        &self,
        record: &LogRecord,
        skip: &SkipFields,
        color: bool,
        diagnostics: &dyn Diagnostics,
    ) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.write_record(record, skip, color)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => diagnostics.report(&e),
            Err(_) => diagnostics.report(&TransportError::Formatting(
                "Console rendering panicked; line skipped".to_string(),
            )),
        }
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MockDiagnostics;
    use crate::domain::Severity;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buf(Arc<Mutex<Vec<u8>>>);

    impl Write for Buf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Panicky;

    impl Write for Panicky {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            panic!("writer exploded");
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_one_line_per_record_in_call_order() {
        let buf = Buf::default();
        let sink = ConsoleSink::new(buf.clone());
        let skip = SkipFields::standard();

        sink.write_record(&LogRecord::new(Severity::INFO, "first"), &skip, false)
            .unwrap();
        sink.write_record(&LogRecord::new(Severity::INFO, "second"), &skip, false)
            .unwrap();

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(written, "first\nsecond\n");
    }

    #[test]
    fn test_write_failure_is_reported_not_raised() {
        let sink = ConsoleSink::new(BrokenPipe);
        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_report()
            .withf(|e| matches!(e, TransportError::Formatting(_)))
            .times(1)
            .return_const(());

        sink.write_console(
            &LogRecord::new(Severity::ERROR, "lost"),
            &SkipFields::standard(),
            true,
            &diagnostics,
        );
    }

    #[test]
    fn test_writer_panic_is_reported_and_sink_stays_usable() {
        let sink = ConsoleSink::new(Panicky);
        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_report()
            .withf(|e| matches!(e, TransportError::Formatting(msg) if msg.contains("panicked")))
            .times(2)
            .return_const(());

        let record = LogRecord::new(Severity::INFO, "x");
        sink.write_console(&record, &SkipFields::standard(), false, &diagnostics);
        sink.write_console(&record, &SkipFields::standard(), false, &diagnostics);
    }
}
