//! Batch scheduler
//!
//! Processes a materialized work list with at most `workers` files in flight.
//! Each file runs in its own task, so a failing or panicking file cannot take
//! down its neighbours. A single completion loop writes result markers, logs
//! failures and advances progress by the completed file's size.
//!
//! Files are read whole, so memory peaks near `workers` times the largest
//! file. `max_file_bytes` bounds that.

use std::path::Path;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use iscc_common::config::UnitBits;
use iscc_common::{ByteSource, IsccMetadata, UnitPool};
use tracing::{error, info};

use crate::error::{BatchItemError, ScanError};
use crate::marker::write_marker;
use crate::progress::{ProgressSnapshot, ProgressState};
use crate::walker::{walk, BatchWorkItem};

/// Batch run settings
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Files processed concurrently
    pub workers: usize,
    pub bits: UnitBits,
    /// Files larger than this fail without being read
    pub max_file_bytes: Option<u64>,
}

/// Totals of a finished batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total_files: usize,
    pub total_bytes: u64,
    pub succeeded: usize,
    pub errors: Vec<BatchItemError>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

/// Compute the metadata record for one file
pub async fn identify_file(pool: &UnitPool, path: &Path) -> iscc_common::Result<IsccMetadata> {
    let source = ByteSource::from_path(path).await?;
    let composite = pool.identify(&source).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(IsccMetadata::new(&composite, &source, name))
}

/// Walk `root` and process every unprocessed file below it
pub async fn run_folder<F>(
    root: &Path,
    config: BatchConfig,
    on_progress: F,
) -> Result<BatchSummary, ScanError>
where
    F: FnMut(&BatchWorkItem, &ProgressSnapshot),
{
    let items: Vec<BatchWorkItem> = walk(root)?.collect();
    info!(
        root = %root.display(),
        files = items.len(),
        bytes = items.iter().map(|item| item.size).sum::<u64>(),
        workers = config.workers,
        "Batch work list ready"
    );
    Ok(run_batch(items, config, on_progress).await)
}

/// Process `items`; never fails as a whole
pub async fn run_batch<F>(
    items: Vec<BatchWorkItem>,
    config: BatchConfig,
    mut on_progress: F,
) -> BatchSummary
where
    F: FnMut(&BatchWorkItem, &ProgressSnapshot),
{
    let started = Instant::now();
    let total_bytes = items.iter().map(|item| item.size).sum();
    let mut summary = BatchSummary {
        total_files: items.len(),
        total_bytes,
        ..Default::default()
    };
    let mut progress = ProgressState::new(total_bytes);

    let workers = config.workers.max(1);
    let pool = UnitPool::standard(workers, config.bits);

    let max_file_bytes = config.max_file_bytes;
    let mut completions = stream::iter(items)
        .map(|item| {
            let pool = pool.clone();
            async move {
                if let Some(limit) = max_file_bytes.filter(|limit| item.size > *limit) {
                    let cause = iscc_common::Error::InvalidInput(format!(
                        "file is {} bytes, limit is {}",
                        item.size, limit
                    ));
                    return (item, Err(cause));
                }
                let path = item.path.clone();
                let result = tokio::spawn(async move { identify_file(&pool, &path).await })
                    .await
                    .unwrap_or_else(|e| {
                        Err(iscc_common::Error::Internal(format!(
                            "worker task failed: {}",
                            e
                        )))
                    });
                (item, result)
            }
        })
        .buffer_unordered(workers);

    while let Some((item, result)) = completions.next().await {
        let outcome = match result {
            Ok(metadata) => write_marker(&item.path, &metadata)
                .await
                .map(|_| metadata)
                .map_err(|e| BatchItemError::new(&item.path, e)),
            Err(cause) => Err(BatchItemError::new(&item.path, cause)),
        };

        let snapshot = match outcome {
            Ok(metadata) => {
                summary.succeeded += 1;
                let snapshot = progress.advance(item.size, true);
                info!(
                    path = %item.path.display(),
                    iscc = %metadata.iscc,
                    progress = %format!("{:.1}%", snapshot.percent()),
                    "Finished {}",
                    display_name(&item)
                );
                snapshot
            }
            Err(e) => {
                let snapshot = progress.advance(item.size, false);
                error!(
                    path = %item.path.display(),
                    error = %e.cause,
                    progress = %format!("{:.1}%", snapshot.percent()),
                    "Failed {}",
                    display_name(&item)
                );
                summary.errors.push(e);
                snapshot
            }
        };

        on_progress(&item, &snapshot);
    }

    info!(
        files = summary.total_files,
        succeeded = summary.succeeded,
        failed = summary.failed(),
        bytes = summary.total_bytes,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch finished"
    );
    summary
}

fn display_name(item: &BatchWorkItem) -> String {
    item.path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| item.path.display().to_string())
}
