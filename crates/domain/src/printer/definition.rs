use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id::{Codepage, PrinterId};
use crate::error::{PrinterError, Result};

pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Conventional serial/USB printer nodes used when no printers are configured.
///
/// Development convenience only: on most machines these paths end up on the
/// spool-file fallback.
pub const DEFAULT_DEVICE_PATHS: [&str; 12] = [
    "/dev/ttyUSB0",
    "/dev/ttyUSB1",
    "/dev/ttyUSB2",
    "/dev/usb/lp0",
    "/dev/usb/lp1",
    "/dev/usb/lp2",
    "/dev/salor-hospitality-front",
    "/dev/salor-hospitality-top",
    "/dev/salor-hospitality-back-top-left",
    "/dev/salor-hospitality-back-top-right",
    "/dev/salor-hospitality-back-bottom-left",
    "/dev/salor-hospitality-back-bottom-right",
];

/// A configured printer: where it lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterDefinition {
    #[serde(default)]
    pub id: Option<PrinterId>,
    pub name: String,
    pub path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub codepage: Codepage,
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}
fn default_copies() -> u32 {
    1
}

impl PrinterDefinition {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            path: path.into(),
            baud_rate: default_baud_rate(),
            codepage: Codepage::DEFAULT,
            copies: default_copies(),
        }
    }

    pub fn with_id(mut self, id: impl Into<PrinterId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_codepage(mut self, codepage: impl Into<Codepage>) -> Self {
        self.codepage = codepage.into();
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    /// Registry key for this definition at `index` in the configured list
    pub fn effective_id(&self, index: usize) -> PrinterId {
        self.id.unwrap_or_else(|| PrinterId::from(index))
    }

    /// Check the per-definition invariants (non-empty path, at least one copy)
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(PrinterError::InvalidDefinition(format!(
                "Printer '{}' has an empty path",
                self.name
            )));
        }
        if self.copies == 0 {
            return Err(PrinterError::InvalidDefinition(format!(
                "Printer '{}' must print at least one copy",
                self.name
            )));
        }
        Ok(())
    }
}

/// Temporary printers on the usual device paths, codepage 0, one copy each
pub fn default_definitions() -> Vec<PrinterDefinition> {
    DEFAULT_DEVICE_PATHS
        .iter()
        .map(|path| {
            let name = path.rsplit('/').next().unwrap_or(path);
            PrinterDefinition::new(name, *path)
        })
        .collect()
}

/// Validate a whole definition list, including uniqueness of effective ids
pub fn validate_definitions(definitions: &[PrinterDefinition]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, definition) in definitions.iter().enumerate() {
        definition.validate()?;
        let id = definition.effective_id(index);
        if !seen.insert(id) {
            return Err(PrinterError::InvalidDefinition(format!(
                "Duplicate printer id {} ('{}')",
                id, definition.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_serde_defaults() {
        let definition: PrinterDefinition = serde_json::from_value(json!({
            "name": "kitchen",
            "path": "/dev/usb/lp0"
        }))
        .unwrap();

        assert_eq!(definition.id, None);
        assert_eq!(definition.baud_rate, 9600);
        assert_eq!(definition.codepage, Codepage::DEFAULT);
        assert_eq!(definition.copies, 1);
    }

    #[test]
    fn test_effective_id_prefers_stable_id() {
        let stable = PrinterDefinition::new("bar", "/dev/ttyUSB0").with_id(17u64);
        let positional = PrinterDefinition::new("bar", "/dev/ttyUSB0");

        assert_eq!(stable.effective_id(4), PrinterId::new(17));
        assert_eq!(positional.effective_id(4), PrinterId::new(4));
    }

    #[test]
    fn test_default_definitions() {
        let defaults = default_definitions();
        assert_eq!(defaults.len(), DEFAULT_DEVICE_PATHS.len());
        assert_eq!(defaults[0].name, "ttyUSB0");
        assert_eq!(defaults[3].name, "lp0");
        assert_eq!(defaults[3].path, "/dev/usb/lp0");
        assert!(
            defaults
                .iter()
                .all(|d| d.copies == 1 && d.codepage == Codepage::DEFAULT && d.id.is_none())
        );
        assert!(validate_definitions(&defaults).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let definition = PrinterDefinition::new("ghost", "  ");
        assert!(matches!(
            definition.validate(),
            Err(PrinterError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_copies() {
        let definition = PrinterDefinition::new("bar", "/dev/usb/lp0").with_copies(0);
        assert!(definition.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        // Stable id 1 collides with the positional id of the second entry
        let definitions = vec![
            PrinterDefinition::new("a", "/dev/usb/lp0").with_id(1u64),
            PrinterDefinition::new("b", "/dev/usb/lp1"),
        ];
        assert!(validate_definitions(&definitions).is_err());
    }
}
