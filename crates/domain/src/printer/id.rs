use serde::{Deserialize, Serialize};

/// Value object identifying a printer inside the registry
///
/// Either the stable id from configuration or, when the definition has none,
/// its positional index in the configured list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrinterId(u64);

impl PrinterId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PrinterId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<usize> for PrinterId {
    fn from(index: usize) -> Self {
        Self(index as u64)
    }
}

impl std::fmt::Display for PrinterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PrinterId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Numeric key into the codepage table
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Codepage(u16);

impl Codepage {
    pub const DEFAULT: Codepage = Codepage(0);

    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl From<u16> for Codepage {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for Codepage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printer_id_from_index() {
        let id = PrinterId::from(3usize);
        assert_eq!(id.value(), 3);
        assert_eq!(id, PrinterId::new(3));
    }

    #[test]
    fn test_printer_id_parse() {
        assert_eq!("42".parse::<PrinterId>().unwrap(), PrinterId::new(42));
        assert_eq!(" 7 ".parse::<PrinterId>().unwrap(), PrinterId::new(7));
        assert!("kitchen".parse::<PrinterId>().is_err());
    }

    #[test]
    fn test_printer_id_display() {
        assert_eq!(format!("{}", PrinterId::new(12)), "12");
    }

    #[test]
    fn test_codepage_serde_transparent() {
        let cp: Codepage = serde_json::from_str("19").unwrap();
        assert_eq!(cp, Codepage::new(19));
        assert_eq!(serde_json::to_string(&cp).unwrap(), "19");
        assert_eq!(Codepage::default(), Codepage::DEFAULT);
    }
}
