use std::sync::Arc;

use domain::{PrinterDefinition, PrinterError, PrinterId, Transcoder};
use infrastructure::{CodepageTable, CodepageTranscoder, PrinterSettings, SystemConnector};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::calibration;
use super::dispatcher::{PrintOutcome, dispatch};
use super::markup::{Insertions, merge_texts};
use super::opener::DeviceOpener;
use super::registry::{OpenHandle, Registry};

/// A device whose close failed; it left the registry but is retried on the next close
#[derive(Debug)]
struct FailedClose {
    id: PrinterId,
    /// Entries that shared the device and were released before it
    aliases: Vec<PrinterId>,
    handle: OpenHandle,
}

impl FailedClose {
    fn ids(&self) -> impl Iterator<Item = PrinterId> + '_ {
        self.aliases.iter().copied().chain(std::iter::once(self.id))
    }
}

/// Result of a close sweep
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CloseReport {
    /// Ids whose device is closed, aliases included
    pub closed: Vec<PrinterId>,
    /// Ids whose device is still held, with the close error
    pub failed: Vec<(PrinterId, PrinterError)>,
}

impl CloseReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the printer registry and runs open, print, identify and close against it
///
/// Methods take `&self`; the registry sits behind a mutex and each device
/// behind its own, so a service can be shared across tasks.
pub struct PrinterService {
    definitions: Vec<PrinterDefinition>,
    opener: DeviceOpener,
    transcoder: Arc<dyn Transcoder>,
    registry: Mutex<Registry>,
    failed_closes: Mutex<Vec<FailedClose>>,
    test_banner: String,
}

impl PrinterService {
    pub fn new(
        definitions: Vec<PrinterDefinition>,
        opener: DeviceOpener,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            definitions,
            opener,
            transcoder,
            registry: Mutex::new(Registry::new()),
            failed_closes: Mutex::new(Vec::new()),
            test_banner: "Printing Test".to_string(),
        }
    }

    /// Wire a service for real hardware from loaded settings
    pub async fn from_settings(settings: &PrinterSettings) -> Result<Self, PrinterError> {
        let definitions = settings.definitions();
        domain::validate_definitions(&definitions)?;

        let table = match &settings.codepage_file {
            Some(path) => CodepageTable::load(path).await?,
            None => CodepageTable::bundled()?,
        };

        let opener = DeviceOpener::from_settings(Arc::new(SystemConnector::new()), settings);
        Ok(Self::new(
            definitions,
            opener,
            Arc::new(CodepageTranscoder::new(table)),
        )
        .with_test_banner(settings.test_banner.clone()))
    }

    pub fn with_test_banner(mut self, banner: impl Into<String>) -> Self {
        self.test_banner = banner.into();
        self
    }

    pub fn definitions(&self) -> &[PrinterDefinition] {
        &self.definitions
    }

    /// Resolve every definition to a device handle
    pub async fn open(&self) {
        info!(printers = self.definitions.len(), "Opening printers");
        let mut registry = self.registry.lock().await;
        let displaced = self.opener.open(&self.definitions, &mut registry).await;

        for handle in displaced {
            if registry.is_aliased(&handle) {
                continue;
            }
            if let Err(e) = handle.device.lock().await.close().await {
                warn!(name = %handle.name, error = %e, "Failed to close replaced device");
            }
        }
    }

    /// Merge `text` with `insertions` and write it to printer `id`
    ///
    /// Returns `Ok(None)` without touching any device when nothing is open.
    pub async fn print(
        &self,
        id: PrinterId,
        text: &str,
        insertions: &Insertions,
    ) -> Result<Option<PrintOutcome>, PrinterError> {
        let handle = {
            let registry = self.registry.lock().await;
            if registry.is_empty() {
                debug!(printer_id = %id, "No open printers, skipping print");
                return Ok(None);
            }
            registry
                .get(id)
                .cloned()
                .ok_or(PrinterError::UnknownPrinterId(id))?
        };

        let payload = merge_texts(self.transcoder.as_ref(), text, insertions, handle.codepage);
        Ok(Some(dispatch(id, &handle, payload).await))
    }

    /// Test print on every configured printer: open, print, close
    pub async fn identify(&self, full_character_test: bool) -> CloseReport {
        info!(full_character_test, "Testing printers");
        self.open().await;

        let handles: Vec<(PrinterId, OpenHandle)> = {
            let registry = self.registry.lock().await;
            registry.iter().map(|(id, h)| (id, h.clone())).collect()
        };

        for (id, handle) in handles {
            info!(printer_id = %id, device = %handle.description, "Testing printer");
            let payload = if full_character_test {
                calibration::character_test(&self.transcoder.calibration_characters())
            } else {
                calibration::banner_test(&self.test_banner, &handle.name, &handle.description)
            };

            if let Err(e) = self.print(id, &payload, &Insertions::new()).await {
                warn!(printer_id = %id, error = %e, "Test print failed");
            }
        }

        self.close().await
    }

    /// Release every open device
    ///
    /// All entries leave the registry. Aliased devices are closed once, when
    /// their last entry goes. A device whose close fails is parked and retried
    /// on the next call.
    pub async fn close(&self) -> CloseReport {
        info!("Closing printers");
        let mut registry = self.registry.lock().await;
        let mut failed = self.failed_closes.lock().await;
        let mut report = CloseReport::default();

        for parked in std::mem::take(&mut *failed) {
            let closed = parked.handle.device.lock().await.close().await;
            match closed {
                Ok(()) => {
                    info!(printer_id = %parked.id, "Closed previously failed device");
                    report.closed.extend(parked.ids());
                }
                Err(e) => {
                    error!(printer_id = %parked.id, error = %e, "Device still fails to close");
                    report.failed.extend(parked.ids().map(|id| (id, e.clone())));
                    failed.push(parked);
                }
            }
        }

        // Aliases whose shared device is still held by a later entry
        let mut released: Vec<(PrinterId, OpenHandle)> = Vec::new();

        for id in registry.ids() {
            let Some(handle) = registry.remove(id) else {
                continue;
            };

            if registry.is_aliased(&handle) {
                debug!(printer_id = %id, device = %handle.description, "Released alias of shared device");
                released.push((id, handle));
                continue;
            }

            let (sharing, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut released)
                .into_iter()
                .partition(|(_, alias)| alias.shares_device_with(&handle));
            released = rest;
            let aliases: Vec<PrinterId> = sharing.into_iter().map(|(alias, _)| alias).collect();

            let closed = handle.device.lock().await.close().await;
            let entry = FailedClose {
                id,
                aliases,
                handle,
            };
            match closed {
                Ok(()) => {
                    info!(printer_id = %id, name = %entry.handle.name, device = %entry.handle.description, "Closed printer");
                    report.closed.extend(entry.ids());
                }
                Err(e) => {
                    error!(printer_id = %id, device = %entry.handle.description, error = %e, "Error while closing printer");
                    report.failed.extend(entry.ids().map(|id| (id, e.clone())));
                    failed.push(entry);
                }
            }
        }

        report
    }

    /// Ids currently in the registry, in order
    pub async fn open_ids(&self) -> Vec<PrinterId> {
        self.registry.lock().await.ids()
    }

    /// Clone of the handle registered under `id`
    pub async fn handle(&self, id: PrinterId) -> Option<OpenHandle> {
        self.registry.lock().await.get(id).cloned()
    }

    /// Printers whose device failed to close and is awaiting a retry
    pub async fn failed_closes(&self) -> Vec<PrinterId> {
        self.failed_closes.lock().await.iter().map(|f| f.id).collect()
    }
}
