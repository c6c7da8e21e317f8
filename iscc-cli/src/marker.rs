//! Result markers
//!
//! `<file>.iscc.json` next to each processed file. Its existence is what marks
//! the file as done, so it only ever appears complete: the JSON is written to
//! `<file>.iscc.json.tmp` first and renamed into place.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use iscc_common::IsccMetadata;

pub const MARKER_SUFFIX: &str = ".iscc.json";
pub const SIGNATURE_SUFFIX: &str = ".iscc.mp7sig";
pub const TEMP_SUFFIX: &str = ".iscc.json.tmp";

/// Marker path for `path`: the full file name plus `.iscc.json`
pub fn marker_path(path: &Path) -> PathBuf {
    with_suffix(path, MARKER_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// True for files the batch engine itself produces
pub fn is_result_artifact(file_name: &str) -> bool {
    [MARKER_SUFFIX, SIGNATURE_SUFFIX, TEMP_SUFFIX]
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

pub fn has_marker(path: &Path) -> bool {
    marker_path(path).exists()
}

/// Atomically write the marker for `path`
pub async fn write_marker(path: &Path, metadata: &IsccMetadata) -> io::Result<PathBuf> {
    let json = metadata
        .to_json_pretty()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let target = marker_path(path);
    let temp = with_suffix(path, TEMP_SUFFIX);

    tokio::fs::write(&temp, json.as_bytes()).await?;
    if let Err(e) = tokio::fs::rename(&temp, &target).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e);
    }

    Ok(target)
}
