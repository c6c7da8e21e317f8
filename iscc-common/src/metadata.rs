//! Serializable description of a computed identifier
//!
//! Written as the batch result marker and printed by the `create` command.

use serde::{Deserialize, Serialize};

use crate::compose::CompositeIdentifier;
use crate::source::ByteSource;
use crate::units::{datahash, UnitCode, UnitKind};

/// Per-unit summary: code, hex digest and base-10 log of the numeric value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub kind: UnitKind,
    pub readable: String,
    pub iscc: String,
    pub hex: String,
    pub log: String,
}

impl From<&UnitCode> for UnitSummary {
    fn from(unit: &UnitCode) -> Self {
        Self {
            kind: unit.kind(),
            readable: unit.readable(),
            iscc: unit.code().to_string(),
            hex: unit.hex_digest(),
            log: unit.log10(),
        }
    }
}

/// Full metadata for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsccMetadata {
    pub iscc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub filesize: u64,
    /// SHA-256 of the raw bytes
    pub digest: String,
    /// blake3 multihash of the raw bytes
    pub datahash: String,
    pub units: Vec<UnitSummary>,
}

impl IsccMetadata {
    pub fn new(composite: &CompositeIdentifier, source: &ByteSource, name: Option<String>) -> Self {
        Self {
            iscc: composite.value().to_string(),
            name,
            filesize: source.len() as u64,
            digest: source.digest().to_string(),
            datahash: datahash(source.bytes()),
            units: composite
                .constituents()
                .iter()
                .map(UnitSummary::from)
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
