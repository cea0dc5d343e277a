use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use domain::{PrinterDefinition, default_definitions};
use serde::{Deserialize, Serialize};

use crate::safe_path::SafeDevicePath;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrinterSettings {
    /// Configured printers, in order. Empty means "use the default device paths".
    #[serde(default)]
    pub printers: Vec<PrinterDefinition>,

    #[serde(default)]
    pub use_safe_device_path: bool,
    #[serde(default = "default_safe_device_path")]
    pub safe_device_path: PathBuf,
    /// Tenant segment appended to `safe_device_path`
    #[serde(default)]
    pub subdomain: Option<String>,

    /// Spool files go to `<fallback_root>/tmp`
    #[serde(default = "default_fallback_root")]
    pub fallback_root: PathBuf,
    #[serde(default = "default_spool_extension")]
    pub spool_extension: String,

    /// Codepage table to load instead of the bundled one
    #[serde(default)]
    pub codepage_file: Option<PathBuf>,

    /// Banner of the short calibration print
    #[serde(default = "default_test_banner")]
    pub test_banner: String,
}

fn default_safe_device_path() -> PathBuf {
    PathBuf::from("/var/spool/escper")
}
fn default_fallback_root() -> PathBuf {
    PathBuf::from("/")
}
fn default_spool_extension() -> String {
    "salor".to_string()
}
fn default_test_banner() -> String {
    "Printing Test".to_string()
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            printers: Vec::new(),
            use_safe_device_path: false,
            safe_device_path: default_safe_device_path(),
            subdomain: None,
            fallback_root: default_fallback_root(),
            spool_extension: default_spool_extension(),
            codepage_file: None,
            test_banner: default_test_banner(),
        }
    }
}

impl PrinterSettings {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Base printer list, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(true))
            // Per-environment overrides
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. ESCPER__USE_SAFE_DEVICE_PATH=true)
            .add_source(Environment::with_prefix("ESCPER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Configured printers, or the default device paths when none are configured
    pub fn definitions(&self) -> Vec<PrinterDefinition> {
        if self.printers.is_empty() {
            tracing::info!(
                "No printers specified. Creating a set of temporary printers with common device paths"
            );
            default_definitions()
        } else {
            self.printers.clone()
        }
    }

    /// Relocation rule when safe device paths are enabled
    pub fn safe_path(&self) -> Option<SafeDevicePath> {
        self.use_safe_device_path
            .then(|| SafeDevicePath::new(self.safe_device_path.clone(), self.subdomain.clone()))
    }

    pub fn spool_dir(&self) -> PathBuf {
        self.fallback_root.join("tmp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Codepage, PrinterId};

    fn write_config(dir: &std::path::Path, contents: &str) {
        std::fs::write(dir.join("default.toml"), contents).unwrap();
    }

    #[test]
    fn test_load_printers_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
fallback_root = "/srv/escper"

[[printers]]
id = 7
name = "kitchen"
path = "/dev/usb/lp0"
codepage = 19
copies = 2

[[printers]]
name = "bar"
path = "/dev/ttyUSB0"
baud_rate = 19200
"#,
        );

        let settings = PrinterSettings::load(dir.path().to_str().unwrap()).unwrap();

        assert_eq!(settings.printers.len(), 2);
        let kitchen = &settings.printers[0];
        assert_eq!(kitchen.id, Some(PrinterId::new(7)));
        assert_eq!(kitchen.codepage, Codepage::new(19));
        assert_eq!(kitchen.copies, 2);
        assert_eq!(kitchen.baud_rate, 9600);

        let bar = &settings.printers[1];
        assert_eq!(bar.id, None);
        assert_eq!(bar.baud_rate, 19200);
        assert_eq!(bar.copies, 1);

        assert_eq!(settings.spool_dir(), PathBuf::from("/srv/escper/tmp"));
        assert!(settings.safe_path().is_none());
    }

    #[test]
    fn test_missing_default_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PrinterSettings::load(dir.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_empty_printer_list_uses_defaults() {
        let settings = PrinterSettings::default();
        let definitions = settings.definitions();
        assert_eq!(definitions.len(), domain::printer::DEFAULT_DEVICE_PATHS.len());
    }

    #[test]
    fn test_safe_path_enabled() {
        let settings = PrinterSettings {
            use_safe_device_path: true,
            safe_device_path: PathBuf::from("/srv/bills"),
            subdomain: Some("acme".to_string()),
            ..Default::default()
        };

        let safe = settings.safe_path().unwrap();
        assert_eq!(
            safe.relocate("/dev/usb/lp1"),
            PathBuf::from("/srv/bills/acme/_dev_usb_lp1.bill")
        );
    }
}
