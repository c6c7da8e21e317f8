//! Code string encoding
//!
//! Every code is `ISCC:` followed by the unpadded RFC 4648 base32 encoding of a
//! two-byte header and a body:
//!
//! ```text
//! byte 0: maintype << 4 | subtype
//! byte 1: version  << 4 | length
//! ```
//!
//! For unit codes `length` is `bits / 32 - 1`. A composite code carries the
//! complete unit codes (header and body) of its constituents, in content, data,
//! instance order, so it can always be decomposed again.

use data_encoding::BASE32_NOPAD;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::units::{UnitCode, UnitKind};
use crate::{Error, Result};

/// Prefix of every code string
pub const PREFIX: &str = "ISCC:";

/// Decimal places used when rendering base-10 logarithms
pub const LOG_DECIMAL_PLACES: usize = 15;

/// Current code version
pub const VERSION: u8 = 0;

/// Content subtype for still images
pub const SUBTYPE_IMAGE: u8 = 1;

/// Subtype for units without a media specific variant
pub const SUBTYPE_NONE: u8 = 0;

/// Header main types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MainType {
    Content = 2,
    Data = 3,
    Instance = 4,
    Iscc = 5,
}

impl MainType {
    pub fn from_nibble(value: u8) -> Result<Self> {
        match value {
            2 => Ok(MainType::Content),
            3 => Ok(MainType::Data),
            4 => Ok(MainType::Instance),
            5 => Ok(MainType::Iscc),
            other => Err(Error::InvalidInput(format!(
                "Unsupported main type: {}",
                other
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MainType::Content => "CONTENT",
            MainType::Data => "DATA",
            MainType::Instance => "INSTANCE",
            MainType::Iscc => "ISCC",
        }
    }
}

/// Pack a header into its two-byte wire form
pub fn encode_header(main_type: MainType, subtype: u8, version: u8, length: u8) -> [u8; 2] {
    [
        ((main_type as u8) << 4) | (subtype & 0x0F),
        ((version & 0x0F) << 4) | (length & 0x0F),
    ]
}

/// Render raw code bytes (header + body) as a code string
pub fn encode_code(raw: &[u8]) -> String {
    format!("{}{}", PREFIX, BASE32_NOPAD.encode(raw))
}

/// Parse a code string back into raw bytes
///
/// Accepts the string with or without the `ISCC:` prefix, in any letter case.
pub fn decode_code(code: &str) -> Result<Vec<u8>> {
    let normalized = code.trim().to_ascii_uppercase();
    let body = normalized.strip_prefix(PREFIX).unwrap_or(&normalized);

    if body.is_empty() {
        return Err(Error::InvalidInput("Empty code".to_string()));
    }

    BASE32_NOPAD
        .decode(body.as_bytes())
        .map_err(|e| Error::InvalidInput(format!("Invalid base32 in code {}: {}", code, e)))
}

/// Split a code (composite or unit) into its unit codes
pub fn decompose(code: &str) -> Result<Vec<UnitCode>> {
    let raw = decode_code(code)?;
    if raw.len() < 2 {
        return Err(Error::InvalidInput(format!("Code too short: {}", code)));
    }

    let main_type = MainType::from_nibble(raw[0] >> 4)?;
    let units_raw = if main_type == MainType::Iscc {
        &raw[2..]
    } else {
        &raw[..]
    };

    let mut units = Vec::new();
    let mut rest = units_raw;
    while !rest.is_empty() {
        let (unit, consumed) = parse_unit(rest)?;
        units.push(unit);
        rest = &rest[consumed..];
    }

    if units.is_empty() {
        return Err(Error::InvalidInput(format!("Code has no units: {}", code)));
    }

    Ok(units)
}

/// Parse one unit from the front of `raw`, returning it and the bytes consumed
fn parse_unit(raw: &[u8]) -> Result<(UnitCode, usize)> {
    if raw.len() < 2 {
        return Err(Error::InvalidInput("Truncated unit header".to_string()));
    }

    let main_type = MainType::from_nibble(raw[0] >> 4)?;
    let kind = UnitKind::from_main_type(main_type)
        .ok_or_else(|| Error::InvalidInput("Nested composite codes are not supported".to_string()))?;
    let subtype = raw[0] & 0x0F;
    let body_len = ((raw[1] & 0x0F) as usize + 1) * 4;

    let end = 2 + body_len;
    if raw.len() < end {
        return Err(Error::InvalidInput(format!(
            "Truncated {} unit: expected {} body bytes, found {}",
            main_type.name(),
            body_len,
            raw.len() - 2
        )));
    }

    Ok((UnitCode::new(kind, subtype, raw[2..end].to_vec()), end))
}

/// Base-10 logarithm of `value`, rendered with [`LOG_DECIMAL_PLACES`] decimals
///
/// The integer part comes from the decimal digit count, so large values keep
/// their magnitude exactly; only the fractional part goes through `f64`.
pub fn log10_string(value: &BigUint) -> String {
    if value.is_zero() {
        return "-inf".to_string();
    }

    let digits = value.to_str_radix(10);
    let exponent = digits.len() - 1;
    let leading = &digits[..digits.len().min(17)];
    let mantissa: f64 = format!("{}.{}0", &leading[..1], &leading[1..])
        .parse()
        .unwrap_or(1.0);

    format!(
        "{:.*}",
        LOG_DECIMAL_PLACES,
        exponent as f64 + mantissa.log10()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = encode_header(MainType::Content, SUBTYPE_IMAGE, VERSION, 1);
        assert_eq!(header, [0x21, 0x01]);

        let header = encode_header(MainType::Iscc, SUBTYPE_IMAGE, VERSION, 0);
        assert_eq!(header, [0x51, 0x00]);
    }

    #[test]
    fn test_encode_uses_prefix_and_base32() {
        let code = encode_code(&[0x30, 0x01, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00]);
        assert!(code.starts_with("ISCC:"));
        assert!(code[5..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
    }

    #[test]
    fn test_decode_accepts_missing_prefix_and_lowercase() {
        let raw = vec![0x40, 0x01, 1, 2, 3, 4, 5, 6, 7, 8];
        let code = encode_code(&raw);
        let bare = code.trim_start_matches(PREFIX).to_ascii_lowercase();

        assert_eq!(decode_code(&code).unwrap(), raw);
        assert_eq!(decode_code(&bare).unwrap(), raw);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_code("ISCC:").is_err());
        assert!(decode_code("ISCC:not base32!").is_err());
    }

    #[test]
    fn test_decompose_unit_code_returns_itself() {
        let unit = UnitCode::new(UnitKind::Data, SUBTYPE_NONE, vec![9; 8]);
        let units = decompose(unit.code()).unwrap();
        assert_eq!(units, vec![unit]);
    }

    #[test]
    fn test_decompose_truncated_unit_fails() {
        // DATA header announcing 64 bits but carrying only 4 bytes
        let code = encode_code(&[0x30, 0x01, 1, 2, 3, 4]);
        assert!(decompose(&code).is_err());
    }

    #[test]
    fn test_log10_rendering() {
        assert_eq!(log10_string(&BigUint::from(1000u32)), "3.000000000000000");
        assert_eq!(log10_string(&BigUint::from(1u32)), "0.000000000000000");
        assert_eq!(log10_string(&BigUint::from(0u32)), "-inf");

        let max_u64 = BigUint::from(u64::MAX);
        assert!(log10_string(&max_u64).starts_with("19.26591972249479"));
    }
}
