//! Immutable, re-readable asset bytes
//!
//! A [`ByteSource`] is cheap to clone and hands every consumer its own read
//! cursor, so the three unit computations never share a stream position.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Shared view over the bytes of one asset
#[derive(Clone, Debug)]
pub struct ByteSource {
    bytes: Bytes,
}

impl ByteSource {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Read a whole file into a byte source
    ///
    /// The file is held in memory until every clone is dropped, so a batch
    /// run peaks at roughly `workers` times its largest file. Callers that
    /// walk untrusted trees should cap sizes before calling this.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(bytes))
    }

    /// Fresh, independent reader positioned at the start of the bytes
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.bytes.clone())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 of the raw bytes, used as the dedup lookup key
    pub fn digest(&self) -> ContentDigest {
        let hash = Sha256::digest(&self.bytes);
        ContentDigest(hex::encode(hash))
    }
}

/// Hex-encoded SHA-256 of the raw asset bytes
///
/// Only ever used as a lookup key; never as an identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_digest_is_sha256_hex() {
        let source = ByteSource::new(&b"abc"[..]);
        assert_eq!(
            source.digest().as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_readers_are_independent() {
        let source = ByteSource::new(vec![1u8, 2, 3, 4]);
        let mut first = source.reader();
        let mut second = source.reader();

        let mut head = [0u8; 2];
        first.read_exact(&mut head).unwrap();
        assert_eq!(head, [1, 2]);

        let mut all = Vec::new();
        second.read_to_end(&mut all).unwrap();
        assert_eq!(all, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = ByteSource::from_path(Path::new("/nonexistent/asset.jpg")).await;
        assert!(result.is_err());
    }
}
