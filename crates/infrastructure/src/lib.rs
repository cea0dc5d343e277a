//! Infrastructure layer - serial lines, files and codepage tables

pub mod codepage;
pub mod config;
pub mod printer;
pub mod safe_path;

pub use codepage::{CodepageTable, CodepageTranscoder};
pub use config::PrinterSettings;
pub use printer::{
    BufferPrinter, DeviceConnector, FileMode, FilePrinter, SerialPrinter, SystemConnector,
};
pub use safe_path::{SafeDevicePath, sanitize_device_path};
