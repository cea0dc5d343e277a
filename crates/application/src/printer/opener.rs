use std::path::PathBuf;
use std::sync::Arc;

use domain::{PrinterDefinition, PrinterId};
use infrastructure::{
    BufferPrinter, DeviceConnector, FileMode, PrinterSettings, SafeDevicePath,
    sanitize_device_path,
};
use tracing::{debug, error, info, warn};

use super::registry::{OpenHandle, Registry};

/// Why a definition ended up on a spool file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolReason {
    /// The device was held open elsewhere and no handle could be reused
    Busy,
    /// The device could not be opened as serial line or file
    NotBusy,
}

impl SpoolReason {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Busy => "fallback-busy",
            Self::NotBusy => "fallback-notbusy",
        }
    }
}

/// Resolves printer definitions to live device handles
///
/// Every definition ends up in the registry: as a serial line, as a file,
/// as an alias of an already open file on the same busy path, or as a spool
/// file under `spool_dir`.
pub struct DeviceOpener {
    connector: Arc<dyn DeviceConnector>,
    safe_path: Option<SafeDevicePath>,
    spool_dir: PathBuf,
    spool_extension: String,
}

impl DeviceOpener {
    pub fn new(connector: Arc<dyn DeviceConnector>, spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            connector,
            safe_path: None,
            spool_dir: spool_dir.into(),
            spool_extension: "salor".to_string(),
        }
    }

    pub fn from_settings(connector: Arc<dyn DeviceConnector>, settings: &PrinterSettings) -> Self {
        Self {
            connector,
            safe_path: settings.safe_path(),
            spool_dir: settings.spool_dir(),
            spool_extension: settings.spool_extension.clone(),
        }
    }

    pub fn with_safe_path(mut self, safe_path: SafeDevicePath) -> Self {
        self.safe_path = Some(safe_path);
        self
    }

    pub fn with_spool_extension(mut self, extension: impl Into<String>) -> Self {
        self.spool_extension = extension.into();
        self
    }

    /// Safe-path mode appends so tenants sharing a spool tree keep earlier prints
    pub fn file_mode(&self) -> FileMode {
        if self.safe_path.is_some() {
            FileMode::Append
        } else {
            FileMode::Truncate
        }
    }

    pub fn effective_path(&self, definition: &PrinterDefinition) -> PathBuf {
        match &self.safe_path {
            Some(safe) => safe.relocate(&definition.path),
            None => PathBuf::from(&definition.path),
        }
    }

    pub fn spool_path(&self, id: PrinterId, name: &str, reason: SpoolReason) -> PathBuf {
        self.spool_dir.join(format!(
            "{}-{}-{}.{}",
            id,
            sanitize_device_path(name),
            reason.marker(),
            self.spool_extension
        ))
    }

    /// Open every definition into `registry`, returning the handles displaced
    /// by re-opened ids so the caller can release them.
    pub async fn open(
        &self,
        definitions: &[PrinterDefinition],
        registry: &mut Registry,
    ) -> Vec<OpenHandle> {
        let mut displaced = Vec::new();
        for (index, definition) in definitions.iter().enumerate() {
            let id = definition.effective_id(index);
            let handle = self.resolve(id, definition, registry).await;
            if let Some(old) = registry.insert(id, handle) {
                displaced.push(old);
            }
        }
        displaced
    }

    async fn resolve(
        &self,
        id: PrinterId,
        definition: &PrinterDefinition,
        registry: &Registry,
    ) -> OpenHandle {
        let path = self.effective_path(definition);
        info!(
            printer_id = %id,
            name = %definition.name,
            path = ?path,
            baud_rate = definition.baud_rate,
            "Trying to open printer"
        );

        match self
            .connector
            .open_serial(&path.to_string_lossy(), definition.baud_rate)
            .await
        {
            Ok(device) => {
                let handle = OpenHandle::new(definition, path, device);
                info!(printer_id = %id, device = %handle.description, "Opened as serial port");
                return handle;
            }
            Err(e) => debug!(printer_id = %id, error = %e, "Failed to open as serial port"),
        }

        let opened = if self.safe_path.is_some() {
            self.connector.open_spool(&path, self.file_mode()).await
        } else {
            self.connector.open_file(&path, self.file_mode()).await
        };

        match opened {
            Ok(device) => {
                let handle = OpenHandle::new(definition, path, device);
                info!(printer_id = %id, device = %handle.description, "Opened as file");
                handle
            }
            Err(e) if e.is_busy() => {
                info!(printer_id = %id, path = ?path, "Device is already open, trying to reuse an open handle");
                match registry.find_file_handle(&path) {
                    Some(existing) => {
                        info!(printer_id = %id, device = %existing.description, "Reused open file handle");
                        OpenHandle::alias(definition, path, existing)
                    }
                    None => self.open_spool(id, definition, SpoolReason::Busy).await,
                }
            }
            Err(e) => {
                warn!(printer_id = %id, error = %e, "Failed to open as serial port or file");
                self.open_spool(id, definition, SpoolReason::NotBusy).await
            }
        }
    }

    async fn open_spool(
        &self,
        id: PrinterId,
        definition: &PrinterDefinition,
        reason: SpoolReason,
    ) -> OpenHandle {
        let path = self.spool_path(id, &definition.name, reason);
        match self.connector.open_spool(&path, self.file_mode()).await {
            Ok(device) => {
                warn!(
                    printer_id = %id,
                    spool = ?path,
                    ?reason,
                    "Printer unavailable, writing to spool file instead"
                );
                OpenHandle::new(definition, path, device)
            }
            Err(e) => {
                error!(
                    printer_id = %id,
                    spool = ?path,
                    error = %e,
                    "Failed to create spool file, keeping output in memory"
                );
                let label = format!("{}-{}-{}", id, definition.name, reason.marker());
                OpenHandle::new(definition, path, Box::new(BufferPrinter::new(label)))
            }
        }
    }
}
