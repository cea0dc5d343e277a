use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use domain::{Codepage, DeviceKind, PrinterDefinition, PrinterDevice, PrinterId};
use tokio::sync::Mutex;

/// A device handle that may be shared by several registry entries
pub type SharedDevice = Arc<Mutex<Box<dyn PrinterDevice>>>;

/// An opened printer: its definition data plus the live device
#[derive(Clone)]
pub struct OpenHandle {
    pub name: String,
    /// Effective path, i.e. after safe-path relocation or spool substitution
    pub path: PathBuf,
    pub copies: u32,
    pub codepage: Codepage,
    pub kind: DeviceKind,
    /// Device representation captured at open time
    pub description: String,
    pub device: SharedDevice,
}

impl OpenHandle {
    pub fn new(
        definition: &PrinterDefinition,
        path: impl Into<PathBuf>,
        device: Box<dyn PrinterDevice>,
    ) -> Self {
        let kind = device.kind();
        let description = device.describe();
        Self {
            name: definition.name.clone(),
            path: path.into(),
            copies: definition.copies,
            codepage: definition.codepage,
            kind,
            description,
            device: Arc::new(Mutex::new(device)),
        }
    }

    /// A handle for `definition` that writes through an already-open device
    pub fn alias(definition: &PrinterDefinition, path: impl Into<PathBuf>, of: &OpenHandle) -> Self {
        Self {
            name: definition.name.clone(),
            path: path.into(),
            copies: definition.copies,
            codepage: definition.codepage,
            kind: of.kind,
            description: of.description.clone(),
            device: Arc::clone(&of.device),
        }
    }

    pub fn shares_device_with(&self, other: &OpenHandle) -> bool {
        Arc::ptr_eq(&self.device, &other.device)
    }
}

impl std::fmt::Debug for OpenHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenHandle")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("copies", &self.copies)
            .field("codepage", &self.codepage)
            .field("device", &self.description)
            .finish()
    }
}

/// Open handles keyed by printer id, iterated in id order
#[derive(Debug, Default)]
pub struct Registry {
    handles: BTreeMap<PrinterId, OpenHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` under `id`, returning the handle it displaced
    pub fn insert(&mut self, id: PrinterId, handle: OpenHandle) -> Option<OpenHandle> {
        self.handles.insert(id, handle)
    }

    pub fn get(&self, id: PrinterId) -> Option<&OpenHandle> {
        self.handles.get(&id)
    }

    pub fn remove(&mut self, id: PrinterId) -> Option<OpenHandle> {
        self.handles.remove(&id)
    }

    pub fn contains(&self, id: PrinterId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<PrinterId> {
        self.handles.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrinterId, &OpenHandle)> {
        self.handles.iter().map(|(id, handle)| (*id, handle))
    }

    /// A file-backed handle already open on `path`, for reuse when the path is busy
    pub fn find_file_handle(&self, path: &Path) -> Option<&OpenHandle> {
        self.handles
            .values()
            .find(|handle| handle.kind == DeviceKind::File && handle.path == path)
    }

    /// Whether any entry still writes through the same device as `handle`
    pub fn is_aliased(&self, handle: &OpenHandle) -> bool {
        self.handles
            .values()
            .any(|other| other.shares_device_with(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure::BufferPrinter;

    fn handle(name: &str, path: &str) -> OpenHandle {
        let definition = PrinterDefinition::new(name, path);
        OpenHandle::new(&definition, path, Box::new(BufferPrinter::new(name)))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        assert!(registry.insert(PrinterId::new(2), handle("bar", "/dev/usb/lp0")).is_none());
        assert!(registry.insert(PrinterId::new(1), handle("kitchen", "/dev/usb/lp1")).is_none());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(PrinterId::new(2)));
        assert_eq!(registry.get(PrinterId::new(1)).unwrap().name, "kitchen");
        // Deterministic id order
        assert_eq!(registry.ids(), vec![PrinterId::new(1), PrinterId::new(2)]);
    }

    #[test]
    fn test_insert_returns_displaced_handle() {
        let mut registry = Registry::new();
        registry.insert(PrinterId::new(1), handle("old", "/dev/usb/lp0"));

        let displaced = registry.insert(PrinterId::new(1), handle("new", "/dev/usb/lp0"));
        assert_eq!(displaced.unwrap().name, "old");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_find_file_handle_ignores_non_file_devices() {
        let mut registry = Registry::new();
        // BufferPrinter reports DeviceKind::Buffer
        registry.insert(PrinterId::new(1), handle("bar", "/dev/usb/lp0"));

        assert!(registry.find_file_handle(Path::new("/dev/usb/lp0")).is_none());
    }

    #[test]
    fn test_alias_tracking() {
        let mut registry = Registry::new();
        let original = handle("bar", "/dev/usb/lp0");
        let alias = OpenHandle::alias(
            &PrinterDefinition::new("bar-copy", "/dev/usb/lp0"),
            "/dev/usb/lp0",
            &original,
        );
        assert!(alias.shares_device_with(&original));

        registry.insert(PrinterId::new(1), original);
        registry.insert(PrinterId::new(2), alias);

        let removed = registry.remove(PrinterId::new(1)).unwrap();
        assert!(registry.is_aliased(&removed));

        let last = registry.remove(PrinterId::new(2)).unwrap();
        assert!(!registry.is_aliased(&last));
    }
}
