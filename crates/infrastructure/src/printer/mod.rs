mod buffer_printer;
mod connector;
mod file_printer;
mod serial_printer;

pub use buffer_printer::BufferPrinter;
pub use connector::{DeviceConnector, SystemConnector};
pub use file_printer::{FileMode, FilePrinter};
pub use serial_printer::SerialPrinter;
