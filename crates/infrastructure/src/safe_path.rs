//! Relocation of device paths into a per-tenant spool tree
//!
//! With safe device paths enabled, a configured path such as `/dev/usb/lp0`
//! is never opened directly. It is flattened into a file name and placed
//! under `<root>/<subdomain>/`, e.g. `/var/spool/escper/acme/_dev_usb_lp0.bill`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

pub const SAFE_PATH_EXTENSION: &str = "bill";

static HOSTILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\s'"&^$#!;*]"#).expect("valid regex"));
static NON_PATH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w/.\-@]").expect("valid regex"));

/// Flatten a raw device path into a shell-safe file name
pub fn sanitize_device_path(path: &str) -> String {
    let replaced = HOSTILE_CHARS.replace_all(path, "_");
    NON_PATH_CHARS.replace_all(&replaced, "").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeDevicePath {
    root: PathBuf,
    subdomain: Option<String>,
}

impl SafeDevicePath {
    pub fn new(root: impl Into<PathBuf>, subdomain: Option<String>) -> Self {
        Self {
            root: root.into(),
            subdomain: subdomain.filter(|s| !s.is_empty()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Effective path for `raw` under this root
    pub fn relocate(&self, raw: &str) -> PathBuf {
        let mut path = self.root.clone();
        if let Some(subdomain) = &self.subdomain {
            path.push(sanitize_device_path(subdomain));
        }
        path.push(format!(
            "{}.{}",
            sanitize_device_path(raw),
            SAFE_PATH_EXTENSION
        ));
        path
    }
}
