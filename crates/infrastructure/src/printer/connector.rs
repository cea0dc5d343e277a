use std::io;
use std::path::Path;

use async_trait::async_trait;
use domain::{PrinterDevice, PrinterError};

use super::file_printer::{FileMode, FilePrinter};
use super::serial_printer::SerialPrinter;

/// Opens concrete transports for the device opener
///
/// A file open refused because the device is held elsewhere must come back as
/// `PrinterError::ResourceBusy`; every other failure as `PrinterError::DeviceOpen`.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn open_serial(
        &self,
        path: &str,
        baud_rate: u32,
    ) -> Result<Box<dyn PrinterDevice>, PrinterError>;

    async fn open_file(
        &self,
        path: &Path,
        mode: FileMode,
    ) -> Result<Box<dyn PrinterDevice>, PrinterError>;

    /// Open a spool file, creating its parent directory first
    async fn open_spool(
        &self,
        path: &Path,
        mode: FileMode,
    ) -> Result<Box<dyn PrinterDevice>, PrinterError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PrinterError::DeviceOpen(format!(
                    "Failed to create spool directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        self.open_file(path, mode).await
    }
}

/// Connector backed by the operating system's serial ports and filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConnector;

impl SystemConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceConnector for SystemConnector {
    async fn open_serial(
        &self,
        path: &str,
        baud_rate: u32,
    ) -> Result<Box<dyn PrinterDevice>, PrinterError> {
        let printer = SerialPrinter::open(path, baud_rate)?;
        Ok(Box::new(printer))
    }

    async fn open_file(
        &self,
        path: &Path,
        mode: FileMode,
    ) -> Result<Box<dyn PrinterDevice>, PrinterError> {
        match FilePrinter::open(path, mode).await {
            Ok(printer) => Ok(Box::new(printer)),
            Err(e) => Err(map_open_error(path, e)),
        }
    }
}

fn map_open_error(path: &Path, e: io::Error) -> PrinterError {
    if e.kind() == io::ErrorKind::ResourceBusy {
        PrinterError::ResourceBusy(format!("{}: {}", path.display(), e))
    } else {
        PrinterError::DeviceOpen(format!("{}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DeviceKind;

    #[test]
    fn test_busy_errors_are_distinguished() {
        let path = Path::new("/dev/usb/lp0");

        let busy = map_open_error(path, io::Error::from(io::ErrorKind::ResourceBusy));
        assert!(busy.is_busy());

        let denied = map_open_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, PrinterError::DeviceOpen(_)));
    }

    #[tokio::test]
    async fn test_open_file_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("lp0");

        let result = SystemConnector::new()
            .open_file(&path, FileMode::Truncate)
            .await;
        assert!(matches!(result, Err(PrinterError::DeviceOpen(_))));
    }

    #[tokio::test]
    async fn test_open_spool_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp").join("3-bar-fallback-busy.salor");

        let device = SystemConnector::new()
            .open_spool(&path, FileMode::Truncate)
            .await
            .unwrap();

        assert_eq!(device.kind(), DeviceKind::File);
        assert!(path.exists());
    }
}
