use thiserror::Error;

use crate::printer::PrinterId;

/// Printer-level errors
///
/// Only `UnknownPrinterId` ever fails a print call. The transport variants are
/// produced by devices and connectors and get absorbed by the opener/dispatcher.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrinterError {
    #[error("Unknown printer id: {0}")]
    UnknownPrinterId(PrinterId),

    #[error("Resource busy: {0}")]
    ResourceBusy(String),

    #[error("Failed to open device: {0}")]
    DeviceOpen(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Byte count mismatch: sent {expected} written {written}")]
    WriteCountMismatch { expected: usize, written: usize },

    #[error("Close failed: {0}")]
    CloseFailed(String),

    #[error("Invalid printer definition: {0}")]
    InvalidDefinition(String),

    #[error("Codepage table error: {0}")]
    Codepage(String),
}

impl PrinterError {
    /// Whether the OS reported the resource as held by someone else
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::ResourceBusy(_))
    }
}

pub type Result<T> = std::result::Result<T, PrinterError>;
