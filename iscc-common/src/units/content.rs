//! Content unit for still images
//!
//! Decodes the image, reduces it to an 8-column grayscale grid with one cell
//! per output bit and sets each bit where the cell is at least as bright as the
//! grid mean. Visually similar images land on nearby codes.

use std::io::{BufRead, Seek};

use image::imageops::FilterType;
use image::ImageReader;

use super::{pack_bits, ComputationError, UnitCode, UnitKind};
use crate::codec::SUBTYPE_IMAGE;

const GRID_COLUMNS: u32 = 8;

pub(super) fn image_code<R: BufRead + Seek>(
    reader: R,
    bits: u32,
) -> Result<UnitCode, ComputationError> {
    let image = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| ComputationError::Unreadable(e.to_string()))?
        .decode()
        .map_err(|e| ComputationError::UnsupportedMedia {
            kind: UnitKind::Content,
            reason: e.to_string(),
        })?;

    let rows = bits / GRID_COLUMNS;
    let grid = image
        .grayscale()
        .resize_exact(GRID_COLUMNS, rows, FilterType::Triangle)
        .to_luma8();

    let pixels: Vec<u32> = grid.pixels().map(|p| p.0[0] as u32).collect();
    let sum: u32 = pixels.iter().sum();
    let count = pixels.len().max(1) as u32;

    // Compare scaled values so the mean needs no rounding
    let body = pack_bits(pixels.iter().map(|&p| p * count >= sum));

    Ok(UnitCode::new(UnitKind::Content, SUBTYPE_IMAGE, body))
}
