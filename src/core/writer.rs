//! Shared output destinations
//!
//! Every physical destination is wrapped exactly once in a [`SharedWriter`];
//! handlers derived from one another clone the handle and therefore share the
//! mutex, so bytes of concurrent records never interleave.

use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write one complete record in a single locked call.
    pub fn write_record(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.inner.lock();
        writer
            .write_all(bytes)
            .map_err(|e| LoggerError::io_operation("writing log record", "destination rejected write", e))
    }

    pub fn flush(&self) -> Result<()> {
        self.inner
            .lock()
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing log destination", "destination rejected flush", e))
    }

    /// Whether both handles write to the same destination.
    pub fn same_destination(&self, other: &SharedWriter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

/// In-memory destination, handy for capturing output.
#[derive(Clone, Default)]
pub struct MemoryBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_memory_buffer_roundtrip() {
        let buffer = MemoryBuffer::new();
        let writer = SharedWriter::new(buffer.clone());
        writer.write_record(b"one\n").unwrap();
        writer.write_record(b"two\n").unwrap();
        assert_eq!(buffer.lines(), vec!["one", "two"]);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clones_share_destination() {
        let writer = SharedWriter::new(MemoryBuffer::new());
        let clone = writer.clone();
        assert!(writer.same_destination(&clone));
        assert!(!writer.same_destination(&SharedWriter::new(MemoryBuffer::new())));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let writer = SharedWriter::new(BrokenPipe);
        let err = writer.write_record(b"x\n").unwrap_err();
        assert!(matches!(err, LoggerError::IoOperation { .. }));
    }

    struct StuckFlush;

    impl Write for StuckFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "device busy"))
        }
    }

    #[test]
    fn test_flush_failure_is_reported() {
        let writer = SharedWriter::new(StuckFlush);
        writer.write_record(b"x\n").unwrap();
        let err = writer.flush().unwrap_err();
        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("flushing log destination"));
        assert!(SharedWriter::new(MemoryBuffer::new()).flush().is_ok());
    }
}
