//! Symbolic form identifiers as written in rule documents.
//!
//! `"Dawnguard.esm:0x00A1B2"` names local id `0xA1B2` inside the document
//! (plugin) `Dawnguard.esm`. The `0x` prefix is optional. Resolution against
//! the host registry happens in the loader; this module only parses.

use std::fmt;

use crate::error::ResolveError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicId {
    pub document: String,
    pub local_id: u32,
}

impl SymbolicId {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::Malformed(raw.to_string());

        // Document names may contain anything but the separator is the last ':'.
        let (document, hex) = raw.trim().rsplit_once(':').ok_or_else(malformed)?;
        let document = document.trim();
        if document.is_empty() {
            return Err(malformed());
        }

        let hex = hex.trim();
        let hex = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex);
        if hex.is_empty() {
            return Err(malformed());
        }
        let local_id = u32::from_str_radix(hex, 16).map_err(|_| malformed())?;

        Ok(Self {
            document: document.to_string(),
            local_id,
        })
    }
}

impl fmt::Display for SymbolicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:0x{:X}", self.document, self.local_id)
    }
}
