use std::time::Duration;

use async_trait::async_trait;
use domain::{DeviceKind, PrinterDevice, PrinterError};
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

const WRITE_TIMEOUT_MS: u64 = 1000;

/// Printer attached to a serial line (RS232, USB-serial adapters)
///
/// Line settings are fixed at 8N1; only the baud rate comes from the definition.
pub struct SerialPrinter {
    path: String,
    baud_rate: u32,
    port: Option<SerialStream>,
}

impl SerialPrinter {
    /// Open `path` as a serial port at `baud_rate`
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, PrinterError> {
        // Normalize port name for Windows (e.g., COM7 -> \\.\COM7)
        let port_name = if cfg!(target_os = "windows") && !path.to_uppercase().starts_with(r"\\.\")
        {
            format!(r"\\.\{}", path)
        } else {
            path.to_string()
        };

        tracing::debug!(port = %port_name, baud_rate, "Opening serial port");

        let port = tokio_serial::new(&port_name, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .timeout(Duration::from_millis(WRITE_TIMEOUT_MS))
            .open_native_async()
            .map_err(|e| {
                tracing::debug!(port = %port_name, error = %e, "Failed to open serial port");
                PrinterError::DeviceOpen(format!(
                    "Failed to open serial port {}: {}",
                    port_name, e
                ))
            })?;

        Ok(Self {
            path: path.to_string(),
            baud_rate,
            port: Some(port),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl PrinterDevice for SerialPrinter {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, PrinterError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| PrinterError::WriteFailed(format!("{} is closed", self.path)))?;

        let mut written = 0;
        while written < bytes.len() {
            match port.write(&bytes[written..]).await {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if written > 0 => {
                    tracing::warn!(port = %self.path, error = %e, written, "Serial write interrupted");
                    break;
                }
                Err(e) => return Err(PrinterError::WriteFailed(format!("Write error: {}", e))),
            }
        }
        Ok(written)
    }

    async fn flush(&mut self) -> Result<(), PrinterError> {
        match self.port.as_mut() {
            Some(port) => port
                .flush()
                .await
                .map_err(|e| PrinterError::WriteFailed(format!("Flush error: {}", e))),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), PrinterError> {
        if let Some(mut port) = self.port.take() {
            port.shutdown()
                .await
                .map_err(|e| PrinterError::CloseFailed(format!("{}: {}", self.path, e)))?;
            tracing::info!(port = %self.path, "Serial port closed");
        }
        Ok(())
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Serial
    }

    fn describe(&self) -> String {
        format!("Serial({}@{}bps)", self.path, self.baud_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_port_fails() {
        let result = SerialPrinter::open("/definitely/not/a/serial/port", 9600);
        assert!(matches!(result, Err(PrinterError::DeviceOpen(_))));
    }

    #[tokio::test]
    async fn test_open_regular_file_as_serial_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let result = SerialPrinter::open(&path, 9600);
        assert!(result.is_err());
    }
}
