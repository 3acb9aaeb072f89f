use crate::wire::{check_text, WireReader, WireWriter};
use crate::CertificateError;
use std::fmt;

/// Handle a persistence backend returns for a stored certificate.
///
/// Encoded independently of certificates as u16-prefixed `format`, u16-prefixed
/// `location`, and a big-endian i32 `era` (generation counter).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageAddress {
    format: String,
    location: String,
    era: i32,
}

impl StorageAddress {
    pub const DEFAULT_FORMAT: &'static str = "icn-pki";
    pub const DEFAULT_LOCATION: &'static str = "icn-pki/certificate";

    pub fn new(
        format: impl Into<String>,
        location: impl Into<String>,
        era: i32,
    ) -> Result<Self, CertificateError> {
        let address = Self {
            format: format.into(),
            location: location.into(),
            era,
        };
        check_text("format", &address.format)?;
        check_text("location", &address.location)?;
        Ok(address)
    }

    /// Address with the default format and location tags.
    pub fn for_era(era: i32) -> Self {
        Self {
            format: Self::DEFAULT_FORMAT.to_string(),
            location: Self::DEFAULT_LOCATION.to_string(),
            era,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn era(&self) -> i32 {
        self.era
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.put_text(&self.format);
        w.put_text(&self.location);
        w.put_i32(self.era);
        w.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CertificateError> {
        let mut r = WireReader::new(bytes);
        let format = r.text("format")?;
        let location = r.text("location")?;
        let era = r.i32("era")?;
        r.finish()?;
        Ok(Self {
            format,
            location,
            era,
        })
    }
}

impl fmt::Display for StorageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.format, self.location, self.era)
    }
}
