use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domain::{DeviceKind, PrinterDevice, PrinterError};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// How a file-backed printer is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileMode {
    /// Truncate on open (device nodes, per-run spool files)
    #[default]
    Truncate,
    /// Append to whatever is there (shared multi-tenant spool directories)
    Append,
}

/// Printer backed by a regular file or a character device node
/// (e.g. `/dev/usb/lp0`), or a spool file standing in for one.
pub struct FilePrinter {
    path: PathBuf,
    file: Option<File>,
}

impl FilePrinter {
    pub async fn open(path: impl AsRef<Path>, mode: FileMode) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            FileMode::Truncate => options.write(true).truncate(true),
            FileMode::Append => options.append(true),
        };

        let file = options.open(&path).await?;
        info!(path = ?path, ?mode, "Opened printer file");

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PrinterDevice for FilePrinter {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, PrinterError> {
        let file = self.file.as_mut().ok_or_else(|| {
            PrinterError::WriteFailed(format!("{} is closed", self.path.display()))
        })?;

        let mut written = 0;
        while written < bytes.len() {
            match file.write(&bytes[written..]).await {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if written > 0 => {
                    tracing::warn!(path = ?self.path, error = %e, written, "File write interrupted");
                    break;
                }
                Err(e) => {
                    return Err(PrinterError::WriteFailed(format!(
                        "Failed to write to printer file {}: {}",
                        self.path.display(),
                        e
                    )));
                }
            }
        }
        Ok(written)
    }

    async fn flush(&mut self) -> Result<(), PrinterError> {
        match self.file.as_mut() {
            Some(file) => file.flush().await.map_err(|e| {
                PrinterError::WriteFailed(format!(
                    "Failed to flush printer file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), PrinterError> {
        if let Some(mut file) = self.file.take() {
            // tokio::fs::File may still hold buffered bytes in a background task
            file.flush().await.map_err(|e| {
                PrinterError::CloseFailed(format!("{}: {}", self.path.display(), e))
            })?;
            info!(path = ?self.path, "Printer file closed");
        }
        Ok(())
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::File
    }

    fn describe(&self) -> String {
        format!("File({})", self.path.display())
    }
}
