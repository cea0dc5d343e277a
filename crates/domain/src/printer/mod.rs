mod definition;
mod device;
mod id;

pub use definition::{
    DEFAULT_BAUD_RATE, DEFAULT_DEVICE_PATHS, PrinterDefinition, default_definitions,
    validate_definitions,
};
pub use device::{DeviceKind, PrinterDevice};
pub use id::{Codepage, PrinterId};
