//! Instance unit: blake3 prefix of the exact bytes

use std::io::Read;

use super::{ComputationError, UnitCode, UnitKind};
use crate::codec::SUBTYPE_NONE;

pub(super) fn instance_code<R: Read>(
    mut reader: R,
    bits: u32,
) -> Result<UnitCode, ComputationError> {
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut reader, &mut hasher)
        .map_err(|e| ComputationError::Unreadable(e.to_string()))?;

    let hash = hasher.finalize();
    let body = hash.as_bytes()[..(bits / 8) as usize].to_vec();

    Ok(UnitCode::new(UnitKind::Instance, SUBTYPE_NONE, body))
}

/// Full blake3 multihash (`1e20` + hex) of the bytes
pub fn datahash(bytes: &[u8]) -> String {
    format!("1e20{}", blake3::hash(bytes).to_hex())
}
