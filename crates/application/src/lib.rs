//! Application layer - printer lifecycle: open, print, identify, close

pub mod printer;

pub use printer::{
    CloseReport, DeviceOpener, Insertions, OpenHandle, PrintOutcome, PrinterService,
    WriteMismatch,
};
