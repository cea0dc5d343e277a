//! Codepage table and the table-driven transcoder
//!
//! The table maps, per codepage id, each non-ASCII character to the byte
//! sequence the printer expects. It is loaded once and shared read-only.

use std::collections::HashMap;
use std::path::Path;

use domain::{Codepage, PrinterError, Transcoder};
use tracing::{debug, info};

/// Table shipped with the crate (PC437, PC850, WPC1252, PC866, PC858)
pub const BUNDLED_CODEPAGES: &str = include_str!("../resources/codepages.json");

const REPLACEMENT: u8 = b'?';
const CALIBRATION_LINE_WIDTH: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct CodepageTable {
    pages: HashMap<Codepage, HashMap<char, Vec<u8>>>,
}

impl CodepageTable {
    pub fn bundled() -> Result<Self, PrinterError> {
        Self::from_json(BUNDLED_CODEPAGES)
    }

    /// Parse `{"<codepage>": {"<char>": [bytes..]}}`
    pub fn from_json(json: &str) -> Result<Self, PrinterError> {
        let raw: HashMap<String, HashMap<String, Vec<u8>>> = serde_json::from_str(json)
            .map_err(|e| PrinterError::Codepage(format!("Invalid codepage table: {}", e)))?;

        let mut pages = HashMap::with_capacity(raw.len());
        for (key, entries) in raw {
            let codepage = key
                .trim()
                .parse::<u16>()
                .map(Codepage::new)
                .map_err(|_| PrinterError::Codepage(format!("Invalid codepage id: {}", key)))?;

            let mut mapping = HashMap::with_capacity(entries.len());
            for (chars, bytes) in entries {
                let mut it = chars.chars();
                let (Some(c), None) = (it.next(), it.next()) else {
                    return Err(PrinterError::Codepage(format!(
                        "Codepage {} entry {:?} must be a single character",
                        codepage, chars
                    )));
                };
                mapping.insert(c, bytes);
            }
            pages.insert(codepage, mapping);
        }

        Ok(Self { pages })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PrinterError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            PrinterError::Codepage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let table = Self::from_json(&json)?;
        info!(path = ?path, codepages = table.pages.len(), "Loaded codepage table");
        Ok(table)
    }

    pub fn contains(&self, codepage: Codepage) -> bool {
        self.pages.contains_key(&codepage)
    }

    pub fn codepages(&self) -> Vec<Codepage> {
        let mut ids: Vec<Codepage> = self.pages.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn lookup(&self, codepage: Codepage, c: char) -> Option<&[u8]> {
        self.pages
            .get(&codepage)
            .and_then(|page| page.get(&c))
            .map(Vec::as_slice)
    }
}

/// Transcoder backed by a [`CodepageTable`]
///
/// ASCII (control bytes included) passes through untouched, so ESC/POS
/// sequences embedded in the text survive. Unknown codepages fall back to
/// codepage 0; unmapped characters become `?`.
#[derive(Debug, Clone)]
pub struct CodepageTranscoder {
    table: CodepageTable,
}

impl CodepageTranscoder {
    pub fn new(table: CodepageTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CodepageTable {
        &self.table
    }
}

impl Transcoder for CodepageTranscoder {
    fn transcode(&self, codepage: Codepage, text: &str) -> Vec<u8> {
        let codepage = if self.table.contains(codepage) {
            codepage
        } else {
            debug!(%codepage, "Unknown codepage, using codepage 0");
            Codepage::DEFAULT
        };

        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii() {
                out.push(c as u8);
            } else if let Some(bytes) = self.table.lookup(codepage, c) {
                out.extend_from_slice(bytes);
            } else {
                out.push(REPLACEMENT);
            }
        }
        out
    }

    fn calibration_characters(&self) -> String {
        let printable = (0x20u8..=0x7E).chain(0xA0u8..=0xFF).map(char::from);

        let mut out = String::new();
        for (i, c) in printable.enumerate() {
            if i > 0 && i % CALIBRATION_LINE_WIDTH == 0 {
                out.push_str("\r\n");
            }
            out.push(c);
        }
        out.push_str("\r\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcoder() -> CodepageTranscoder {
        CodepageTranscoder::new(CodepageTable::bundled().unwrap())
    }

    #[test]
    fn test_bundled_table_loads() {
        let table = CodepageTable::bundled().unwrap();
        assert_eq!(
            table.codepages(),
            vec![
                Codepage::new(0),
                Codepage::new(2),
                Codepage::new(16),
                Codepage::new(17),
                Codepage::new(19)
            ]
        );
    }

    #[test]
    fn test_ascii_and_control_bytes_pass_through() {
        let out = transcoder().transcode(Codepage::DEFAULT, "\x1b@Total: 12.50\n");
        assert_eq!(out, b"\x1b@Total: 12.50\n".to_vec());
    }

    #[test]
    fn test_codepage_specific_mapping() {
        let t = transcoder();
        assert_eq!(t.transcode(Codepage::new(0), "ä"), vec![0x84]);
        assert_eq!(t.transcode(Codepage::new(16), "ä"), vec![0xE4]);
        assert_eq!(t.transcode(Codepage::new(19), "€"), vec![0xD5]);
    }

    #[test]
    fn test_unmapped_character_is_replaced() {
        // PC437 has no euro sign
        assert_eq!(transcoder().transcode(Codepage::new(0), "5€"), b"5?".to_vec());
    }

    #[test]
    fn test_unknown_codepage_uses_default() {
        let t = transcoder();
        assert_eq!(
            t.transcode(Codepage::new(999), "Grüße"),
            t.transcode(Codepage::DEFAULT, "Grüße")
        );
    }

    #[test]
    fn test_calibration_characters() {
        let chars = transcoder().calibration_characters();
        assert!(chars.starts_with(" !\"#$%&'()*+,-./\r\n0123"));
        assert!(chars.contains('~'));
        assert!(chars.contains('ÿ'));
        assert!(chars.ends_with("\r\n"));
    }

    #[test]
    fn test_rejects_multi_char_keys() {
        let result = CodepageTable::from_json(r#"{"0": {"ab": [1]}}"#);
        assert!(matches!(result, Err(PrinterError::Codepage(_))));
    }

    #[test]
    fn test_rejects_non_numeric_codepage() {
        let result = CodepageTable::from_json(r#"{"latin": {"é": [130]}}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_fatal() {
        let result = CodepageTable::load("/nonexistent/codepages.json").await;
        assert!(matches!(result, Err(PrinterError::Codepage(_))));
    }
}
