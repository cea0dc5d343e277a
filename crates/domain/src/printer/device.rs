use async_trait::async_trait;

use crate::error::PrinterError;

/// Concrete transport behind a device handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Serial,
    File,
    /// In-memory sink, used when nothing on disk could be opened
    Buffer,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "Serial",
            Self::File => "File",
            Self::Buffer => "Buffer",
        }
    }
}

/// Writable, flushable, closable printer resource
///
/// Serial lines and regular files both implement this, so once a handle is
/// open the caller never needs to know which one it got.
#[async_trait]
pub trait PrinterDevice: Send + Sync {
    /// Write `bytes`, returning how many the device accepted
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, PrinterError>;

    async fn flush(&mut self) -> Result<(), PrinterError>;

    /// Release the underlying resource. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), PrinterError>;

    fn kind(&self) -> DeviceKind;

    /// Human readable representation, e.g. `File(/dev/usb/lp0)`
    fn describe(&self) -> String;
}
