pub mod calibration;
pub mod dispatcher;
pub mod markup;
pub mod opener;
pub mod registry;
pub mod service;

pub use dispatcher::{PrintOutcome, WriteMismatch};
pub use markup::{Insertions, MARKUP_CLOSE, MARKUP_OPEN, markup_token, merge_texts};
pub use opener::{DeviceOpener, SpoolReason};
pub use registry::{OpenHandle, Registry, SharedDevice};
pub use service::{CloseReport, PrinterService};
