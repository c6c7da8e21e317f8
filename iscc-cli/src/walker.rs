//! Batch walker
//!
//! Lazy depth-first traversal yielding unprocessed files with their sizes.
//! At each level entries are ordered by name with subdirectories first, so a
//! directory is fully enumerated before its sibling files.
//!
//! Skipped:
//! - symbolic links (never followed)
//! - result artifacts (`.iscc.json`, `.iscc.mp7sig`, `.iscc.json.tmp`)
//! - files that already have a result marker
//!
//! The marker skip is what makes runs resumable: walking a partially processed
//! tree yields exactly the files still missing a marker.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;
use crate::marker::{has_marker, is_result_artifact};

/// One file scheduled for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWorkItem {
    pub path: PathBuf,
    pub size: u64,
}

/// Iterator over the unprocessed files below a root folder
pub struct BatchWalker {
    inner: walkdir::IntoIter,
}

/// Start walking `root`
///
/// Fails only when `root` is missing or not a directory.
pub fn walk(root: &Path) -> Result<BatchWalker, ScanError> {
    if !root.exists() {
        return Err(ScanError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let inner = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by(dirs_first_by_name)
        .into_iter();

    Ok(BatchWalker { inner })
}

fn dirs_first_by_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

impl Iterator for BatchWalker {
    type Item = BatchWorkItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                debug!(path = %entry.path().display(), "Skipping symlink");
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            if is_result_artifact(&entry.file_name().to_string_lossy()) {
                continue;
            }
            if has_marker(entry.path()) {
                debug!(path = %entry.path().display(), "Already processed");
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    return Some(BatchWorkItem {
                        path: entry.into_path(),
                        size: metadata.len(),
                    })
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Skipping file without metadata");
                }
            }
        }
    }
}
