use std::sync::Arc;

use async_trait::async_trait;
use domain::{DeviceKind, PrinterDevice, PrinterError};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct BufferState {
    data: Vec<u8>,
    writes: usize,
    flushes: usize,
    closes: usize,
    closed: bool,
}

/// In-memory printer
///
/// Stands in for a device when not even a spool file could be created, and
/// doubles as a recording device in tests. Clones share the same buffer.
#[derive(Clone)]
pub struct BufferPrinter {
    label: String,
    state: Arc<Mutex<BufferState>>,
    capacity: Option<usize>,
    close_failures: usize,
}

impl BufferPrinter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Arc::new(Mutex::new(BufferState::default())),
            capacity: None,
            close_failures: 0,
        }
    }

    /// Accept at most `capacity` bytes in total; later writes come up short
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Make every `close` call fail
    pub fn failing_close(self) -> Self {
        self.failing_closes(usize::MAX)
    }

    /// Fail the first `count` close calls, then close normally
    pub fn failing_closes(mut self, count: usize) -> Self {
        self.close_failures = count;
        self
    }

    pub async fn sent_data(&self) -> Vec<u8> {
        self.state.lock().await.data.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.state.lock().await.writes
    }

    pub async fn flush_count(&self) -> usize {
        self.state.lock().await.flushes
    }

    pub async fn close_count(&self) -> usize {
        self.state.lock().await.closes
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

#[async_trait]
impl PrinterDevice for BufferPrinter {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, PrinterError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(PrinterError::WriteFailed(format!("{} is closed", self.label)));
        }
        state.writes += 1;

        let accepted = match self.capacity {
            Some(capacity) => bytes.len().min(capacity.saturating_sub(state.data.len())),
            None => bytes.len(),
        };
        state.data.extend_from_slice(&bytes[..accepted]);
        Ok(accepted)
    }

    async fn flush(&mut self) -> Result<(), PrinterError> {
        self.state.lock().await.flushes += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PrinterError> {
        let mut state = self.state.lock().await;
        state.closes += 1;
        if state.closes <= self.close_failures {
            return Err(PrinterError::CloseFailed(format!(
                "{}: simulated close failure",
                self.label
            )));
        }
        state.closed = true;
        Ok(())
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Buffer
    }

    fn describe(&self) -> String {
        format!("Buffer({})", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_data() {
        let printer = BufferPrinter::new("bar");
        let mut handle = printer.clone();

        handle.write(b"\x1b@hello").await.unwrap();
        handle.flush().await.unwrap();

        assert_eq!(printer.sent_data().await, b"\x1b@hello".to_vec());
        assert_eq!(printer.write_count().await, 1);
        assert_eq!(printer.flush_count().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_limits_writes() {
        let mut printer = BufferPrinter::new("tiny").with_capacity(4);

        assert_eq!(printer.write(b"abc").await.unwrap(), 3);
        assert_eq!(printer.write(b"def").await.unwrap(), 1);
        assert_eq!(printer.write(b"ghi").await.unwrap(), 0);
        assert_eq!(printer.sent_data().await, b"abcd".to_vec());
    }

    #[tokio::test]
    async fn test_failing_close() {
        let mut printer = BufferPrinter::new("stuck").failing_close();

        assert!(matches!(
            printer.close().await,
            Err(PrinterError::CloseFailed(_))
        ));
        assert!(!printer.is_closed().await);
        assert_eq!(printer.close_count().await, 1);
    }

    #[tokio::test]
    async fn test_close_recovers_after_failures() {
        let mut printer = BufferPrinter::new("flaky").failing_closes(1);

        assert!(printer.close().await.is_err());
        assert!(printer.close().await.is_ok());
        assert!(printer.is_closed().await);
        assert_eq!(printer.close_count().await, 2);
    }
}
