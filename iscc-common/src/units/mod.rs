//! Unit codes and their computation
//!
//! A unit code is one of three independent fingerprints of the same asset
//! bytes. The fingerprint functions themselves sit behind [`UnitComputer`] so the
//! composition and scheduling layers never depend on a particular algorithm;
//! [`StandardUnits`] is the built-in implementation.

mod content;
mod data;
mod instance;

pub use instance::datahash;

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, MainType};
use crate::source::ByteSource;

/// Smallest supported unit length in bits
pub const MIN_BITS: u32 = 32;

/// Largest supported unit length in bits
pub const MAX_BITS: u32 = 256;

/// Unit computation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComputationError {
    /// Source bytes could not be read
    #[error("Unreadable source: {0}")]
    Unreadable(String),

    /// Source is not a media type the computation understands
    #[error("Unsupported media for {kind} unit: {reason}")]
    UnsupportedMedia { kind: UnitKind, reason: String },

    /// Requested bit length is not a multiple of 32 in 32..=256
    #[error("Invalid bit length {0} (expected a multiple of 32 between 32 and 256)")]
    InvalidBits(u32),

    /// Worker running the computation died or was shut down
    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    /// Fan-out did not finish within the request deadline
    #[error("Computation timed out after {0} ms")]
    Timeout(u64),
}

/// The three unit kinds, in composition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Content-similarity fingerprint (perceptual)
    Content,
    /// Data-similarity fingerprint (byte level)
    Data,
    /// Cryptographic instance hash
    Instance,
}

impl UnitKind {
    /// Composition order
    pub const ALL: [UnitKind; 3] = [UnitKind::Content, UnitKind::Data, UnitKind::Instance];

    pub fn main_type(self) -> MainType {
        match self {
            UnitKind::Content => MainType::Content,
            UnitKind::Data => MainType::Data,
            UnitKind::Instance => MainType::Instance,
        }
    }

    pub fn from_main_type(main_type: MainType) -> Option<Self> {
        match main_type {
            MainType::Content => Some(UnitKind::Content),
            MainType::Data => Some(UnitKind::Data),
            MainType::Instance => Some(UnitKind::Instance),
            MainType::Iscc => None,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Content => f.write_str("content"),
            UnitKind::Data => f.write_str("data"),
            UnitKind::Instance => f.write_str("instance"),
        }
    }
}

/// One computed unit fingerprint
///
/// Immutable once built; the code string is derived from kind, subtype and body
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCode {
    kind: UnitKind,
    subtype: u8,
    body: Vec<u8>,
    code: String,
}

impl UnitCode {
    /// Build a unit from its raw body
    ///
    /// The body length must be a multiple of 4 bytes between 4 and 32.
    pub fn new(kind: UnitKind, subtype: u8, body: Vec<u8>) -> Self {
        let length = (body.len() / 4).saturating_sub(1) as u8;
        let header = codec::encode_header(kind.main_type(), subtype, codec::VERSION, length);
        let code = codec::encode_code(&[&header[..], &body[..]].concat());

        Self {
            kind,
            subtype,
            body,
            code,
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn subtype(&self) -> u8 {
        self.subtype
    }

    /// Code string, e.g. `ISCC:EEA...`
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Bit length of the body
    pub fn bits(&self) -> u32 {
        (self.body.len() * 8) as u32
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Header followed by body, as embedded in composite codes
    pub fn raw(&self) -> Vec<u8> {
        let length = (self.body.len() / 4).saturating_sub(1) as u8;
        let header =
            codec::encode_header(self.kind.main_type(), self.subtype, codec::VERSION, length);
        [&header[..], &self.body[..]].concat()
    }

    pub fn hex_digest(&self) -> String {
        hex::encode(&self.body)
    }

    /// Body interpreted as a big-endian unsigned integer
    pub fn numeric_value(&self) -> BigUint {
        BigUint::from_bytes_be(&self.body)
    }

    /// Base-10 logarithm of the numeric value at fixed precision
    pub fn log10(&self) -> String {
        codec::log10_string(&self.numeric_value())
    }

    /// Human readable form: `MAINTYPE-SUBTYPE-V0-<bits>-<hex>`
    pub fn readable(&self) -> String {
        let subtype = match (self.kind, self.subtype) {
            (UnitKind::Content, codec::SUBTYPE_IMAGE) => "IMAGE".to_string(),
            (_, codec::SUBTYPE_NONE) => "NONE".to_string(),
            (_, other) => format!("SUBTYPE{}", other),
        };
        format!(
            "{}-{}-V{}-{}-{}",
            self.kind.main_type().name(),
            subtype,
            codec::VERSION,
            self.bits(),
            self.hex_digest()
        )
    }
}

/// External fingerprint function boundary
///
/// Implementations must be pure: the same kind, bytes and bit length always
/// yield the same unit code. Each call must read through its own cursor from
/// [`ByteSource::reader`].
pub trait UnitComputer: Send + Sync + 'static {
    fn compute_unit(
        &self,
        kind: UnitKind,
        source: &ByteSource,
        bits: u32,
    ) -> Result<UnitCode, ComputationError>;
}

/// Built-in unit computations
///
/// - Content: mean-threshold hash over a downscaled grayscale image
/// - Data: simhash over content-defined chunks
/// - Instance: blake3 prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardUnits;

impl UnitComputer for StandardUnits {
    fn compute_unit(
        &self,
        kind: UnitKind,
        source: &ByteSource,
        bits: u32,
    ) -> Result<UnitCode, ComputationError> {
        validate_bits(bits)?;

        match kind {
            UnitKind::Content => content::image_code(source.reader(), bits),
            UnitKind::Data => data::data_code(source.reader(), bits),
            UnitKind::Instance => instance::instance_code(source.reader(), bits),
        }
    }
}

/// Compute one unit with the built-in implementation
pub fn compute_unit(
    kind: UnitKind,
    source: &ByteSource,
    bits: u32,
) -> Result<UnitCode, ComputationError> {
    StandardUnits.compute_unit(kind, source, bits)
}

/// Check that `bits` is a multiple of 32 in the supported range
pub fn validate_bits(bits: u32) -> Result<(), ComputationError> {
    if bits % 32 != 0 || !(MIN_BITS..=MAX_BITS).contains(&bits) {
        return Err(ComputationError::InvalidBits(bits));
    }
    Ok(())
}

/// Pack booleans MSB-first into bytes
fn pack_bits(bits: impl IntoIterator<Item = bool>) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, bit) in bits.into_iter().enumerate() {
        if i % 8 == 0 {
            out.push(0);
        }
        if bit {
            if let Some(last) = out.last_mut() {
                *last |= 0x80 >> (i % 8);
            }
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod test_images {
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    /// Smooth PNG gradient; `seed` only shifts the blue channel
    pub fn gradient_png(width: u32, height: u32, seed: u8) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            Rgb([r, g, seed])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }
}
