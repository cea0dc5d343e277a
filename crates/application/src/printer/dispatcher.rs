use domain::{PrinterError, PrinterId};
use tracing::{debug, error, info, warn};

use super::registry::OpenHandle;

/// One copy that reached the device short
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteMismatch {
    /// 1-based copy number
    pub copy: u32,
    pub expected: usize,
    pub written: usize,
}

/// What a print call sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOutcome {
    /// Byte count reported by the final copy's write
    pub bytes_written: usize,
    /// Merged payload that was written `copies` times
    pub payload: Vec<u8>,
    pub mismatches: Vec<WriteMismatch>,
}

/// Write `payload` to the handle's device once per copy, then flush once.
///
/// The device lock is held for the whole job so aliased printers never
/// interleave. Transport errors are logged and counted as short writes.
pub async fn dispatch(id: PrinterId, handle: &OpenHandle, payload: Vec<u8>) -> PrintOutcome {
    info!(
        printer_id = %id,
        name = %handle.name,
        device = %handle.description,
        copies = handle.copies,
        bytes = payload.len(),
        "Printing"
    );

    let mut device = handle.device.lock().await;
    let mut bytes_written = 0;
    let mut mismatches = Vec::new();

    for copy in 1..=handle.copies {
        let written = match device.write(&payload).await {
            Ok(n) => n,
            Err(e) => {
                error!(printer_id = %id, copy, error = %e, "Write failed");
                0
            }
        };

        if written != payload.len() {
            let mismatch = PrinterError::WriteCountMismatch {
                expected: payload.len(),
                written,
            };
            warn!(printer_id = %id, copy, "{}", mismatch);
            mismatches.push(WriteMismatch {
                copy,
                expected: payload.len(),
                written,
            });
        }
        bytes_written = written;
    }

    if let Err(e) = device.flush().await {
        warn!(printer_id = %id, error = %e, "Flush failed");
    }
    drop(device);

    debug!(
        printer_id = %id,
        preview = %String::from_utf8_lossy(&payload[..payload.len().min(60)]),
        "Printed"
    );

    PrintOutcome {
        bytes_written,
        payload,
        mismatches,
    }
}
