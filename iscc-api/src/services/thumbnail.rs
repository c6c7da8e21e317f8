//! Thumbnail derivation
//!
//! Thumbnails are JPEGs bounded by 128x128, lightly sharpened, stored as
//! `<dir>/<identifier>.jpg`. The write is idempotent: an existing file is left
//! alone, and new files appear atomically via a temp file and rename.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::ImageFormat;
use iscc_common::codec::PREFIX;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Bounding box of generated thumbnails
pub const THUMBNAIL_SIZE: u32 = 128;

const UNSHARPEN_SIGMA: f32 = 0.8;
const UNSHARPEN_THRESHOLD: i32 = 2;

/// Thumbnail step errors
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// Asset bytes are not a decodable image
    #[error("Cannot decode image: {0}")]
    Decode(String),

    #[error("Cannot encode thumbnail: {0}")]
    Encode(String),

    #[error("Thumbnail I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

/// Result of a thumbnail write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    Written(PathBuf),
    AlreadyPresent(PathBuf),
}

/// Writes thumbnails into one directory
#[derive(Debug, Clone)]
pub struct ThumbnailWriter {
    dir: PathBuf,
}

impl ThumbnailWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the thumbnail for `iscc`; the `ISCC:` prefix is dropped
    pub fn path_for(&self, iscc: &str) -> PathBuf {
        let key = iscc.strip_prefix(PREFIX).unwrap_or(iscc);
        self.dir.join(format!("{}.jpg", key))
    }

    /// Derive and store the thumbnail unless one already exists
    pub async fn write_if_absent(
        &self,
        iscc: &str,
        bytes: Bytes,
    ) -> Result<ThumbnailOutcome, ThumbnailError> {
        let target = self.path_for(iscc);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!(path = %target.display(), "Thumbnail already present");
            return Ok(ThumbnailOutcome::AlreadyPresent(target));
        }

        let jpeg = tokio::task::spawn_blocking(move || render_thumbnail(&bytes))
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))??;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ThumbnailError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let temp = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&temp, &jpeg)
            .await
            .map_err(|source| ThumbnailError::Io {
                path: temp.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(ThumbnailError::Io {
                path: target,
                source,
            });
        }

        debug!(path = %target.display(), size = jpeg.len(), "Thumbnail written");
        Ok(ThumbnailOutcome::Written(target))
    }
}

/// Decode, shrink into the bounding box, sharpen and encode as JPEG
pub fn render_thumbnail(bytes: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
    let img =
        image::load_from_memory(bytes).map_err(|e| ThumbnailError::Decode(e.to_string()))?;

    let thumb = img
        .thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
        .unsharpen(UNSHARPEN_SIGMA, UNSHARPEN_THRESHOLD)
        .to_rgb8();

    let mut out = Cursor::new(Vec::new());
    thumb
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
