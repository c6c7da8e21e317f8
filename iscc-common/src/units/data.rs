//! Data unit
//!
//! Splits the byte stream into content-defined chunks with a rolling hash,
//! derives a feature per chunk and folds the features into a simhash. Inserting
//! or removing bytes only disturbs the chunks around the edit.

use std::io::Read;

use super::{pack_bits, ComputationError, UnitCode, UnitKind};
use crate::codec::SUBTYPE_NONE;

const MIN_CHUNK: usize = 256;
const MAX_CHUNK: usize = 8192;
const BOUNDARY_MASK: u64 = (1 << 10) - 1;
const READ_BUFFER: usize = 64 * 1024;

pub(super) fn data_code<R: Read>(mut reader: R, bits: u32) -> Result<UnitCode, ComputationError> {
    let feature_len = (bits / 8) as usize;
    let mut votes = vec![0i64; bits as usize];

    let mut buffer = vec![0u8; READ_BUFFER];
    let mut chunk = blake3::Hasher::new();
    let mut chunk_len = 0usize;
    let mut rolling = 0u64;
    let mut chunks = 0usize;

    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| ComputationError::Unreadable(e.to_string()))?;
        if read == 0 {
            break;
        }

        let mut start = 0;
        for (i, &byte) in buffer[..read].iter().enumerate() {
            rolling = rolling.rotate_left(1) ^ (byte as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            chunk_len += 1;

            let at_boundary = chunk_len >= MIN_CHUNK && rolling & BOUNDARY_MASK == 0;
            if at_boundary || chunk_len >= MAX_CHUNK {
                chunk.update(&buffer[start..=i]);
                vote(&mut votes, &chunk, feature_len);
                chunks += 1;

                chunk = blake3::Hasher::new();
                chunk_len = 0;
                rolling = 0;
                start = i + 1;
            }
        }
        chunk.update(&buffer[start..read]);
    }

    // Trailing bytes (or an empty stream) form the last chunk
    if chunk_len > 0 || chunks == 0 {
        vote(&mut votes, &chunk, feature_len);
    }

    let body = pack_bits(votes.iter().map(|&v| v > 0));
    Ok(UnitCode::new(UnitKind::Data, SUBTYPE_NONE, body))
}

fn vote(votes: &mut [i64], chunk: &blake3::Hasher, feature_len: usize) {
    let mut feature = vec![0u8; feature_len];
    chunk.finalize_xof().fill(&mut feature);

    for (i, slot) in votes.iter_mut().enumerate() {
        if feature[i / 8] & (0x80 >> (i % 8)) != 0 {
            *slot += 1;
        } else {
            *slot -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 31) ^ (i >> 3)) as u8).collect()
    }

    #[test]
    fn test_empty_stream_has_code() {
        let unit = data_code(Cursor::new(Vec::new()), 64).unwrap();
        assert_eq!(unit.bits(), 64);
        assert_eq!(unit.kind(), UnitKind::Data);
    }

    #[test]
    fn test_read_buffer_size_does_not_matter() {
        // Chunk boundaries must not depend on how the reader splits the stream
        struct Trickle(Cursor<Vec<u8>>);
        impl Read for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let max = buf.len().min(7);
                self.0.read(&mut buf[..max])
            }
        }

        let bytes = sample(100_000);
        let whole = data_code(Cursor::new(bytes.clone()), 64).unwrap();
        let trickled = data_code(Trickle(Cursor::new(bytes)), 64).unwrap();
        assert_eq!(whole, trickled);
    }

    #[test]
    fn test_small_edit_keeps_most_bits() {
        let original = sample(200_000);
        let mut edited = original.clone();
        edited[100_000] ^= 0xFF;

        let a = data_code(Cursor::new(original), 64).unwrap();
        let b = data_code(Cursor::new(edited), 64).unwrap();

        let distance: u32 = a
            .body()
            .iter()
            .zip(b.body())
            .map(|(x, y)| (x ^ y).count_ones())
            .sum();
        assert!(distance < 16, "hamming distance too large: {}", distance);
    }
}
