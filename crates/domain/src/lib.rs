//! Domain layer - printer types and contracts with no transport dependencies
//!
//! This crate contains:
//! - Value objects (PrinterId, Codepage)
//! - The printer definition entity and its validation rules
//! - The device contract every transport implements (PrinterDevice)
//! - The text-to-bytes contract consumed by the core (Transcoder)
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Transport-agnostic: serial lines and plain files look the same here
//! - Testable in isolation

pub mod error;
pub mod printer;
pub mod transcoder;

// Re-export commonly used types
pub use error::{PrinterError, Result};
pub use printer::{
    Codepage, DeviceKind, PrinterDefinition, PrinterDevice, PrinterId, default_definitions,
    validate_definitions,
};
pub use transcoder::Transcoder;
