//! Persistence pipeline
//!
//! Runs strictly after composition, off the response path. Steps:
//! 1. Thumbnail keyed by the identifier (skipped when already present)
//! 2. Metadata record POSTed to the storage service
//! 3. Raw bytes POSTed to the notification service
//!
//! Every step runs regardless of how the previous one ended. Failures are
//! logged and recorded in the report; nothing is retried.

use bytes::Bytes;
use iscc_common::{CompositeIdentifier, ContentDigest};
use tracing::{debug, info, warn};

use super::notification_client::media_type;
use super::storage_client::StorageRecord;
use super::thumbnail::ThumbnailOutcome;
use super::{NotificationClient, StorageClient, ThumbnailWriter};

/// Everything the pipeline needs about one computed asset
#[derive(Debug, Clone)]
pub struct PersistenceJob {
    pub composite: CompositeIdentifier,
    pub digest: ContentDigest,
    pub source_url: String,
    pub bytes: Bytes,
    /// Media type declared on the upload, if any
    pub content_type: Option<String>,
}

/// How one pipeline step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Step not configured
    Skipped,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// Outcome of every step for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceReport {
    pub thumbnail: StepOutcome,
    pub storage: StepOutcome,
    pub notification: StepOutcome,
}

impl PersistenceReport {
    pub fn is_complete(&self) -> bool {
        !(self.thumbnail.is_failed() || self.storage.is_failed() || self.notification.is_failed())
    }
}

/// Thumbnail writer plus the optional downstream services
#[derive(Debug, Clone)]
pub struct PersistencePipeline {
    thumbnails: ThumbnailWriter,
    storage: Option<StorageClient>,
    notifier: Option<NotificationClient>,
}

impl PersistencePipeline {
    pub fn new(
        thumbnails: ThumbnailWriter,
        storage: Option<StorageClient>,
        notifier: Option<NotificationClient>,
    ) -> Self {
        Self {
            thumbnails,
            storage,
            notifier,
        }
    }

    pub async fn run(&self, job: PersistenceJob) -> PersistenceReport {
        let iscc = job.composite.value();

        let thumbnail = match self.thumbnails.write_if_absent(iscc, job.bytes.clone()).await {
            Ok(ThumbnailOutcome::Written(_)) | Ok(ThumbnailOutcome::AlreadyPresent(_)) => {
                StepOutcome::Done
            }
            Err(e) => {
                warn!(iscc = %iscc, error = %e, "Thumbnail step failed");
                StepOutcome::Failed(e.to_string())
            }
        };

        let storage = match &self.storage {
            None => {
                debug!(iscc = %iscc, "No storage service configured");
                StepOutcome::Skipped
            }
            Some(client) => {
                let record = StorageRecord::new(&job.composite, &job.digest, &job.source_url);
                match client.store(&record).await {
                    Ok(status) => {
                        info!(iscc = %iscc, status, "Stored metadata record");
                        StepOutcome::Done
                    }
                    Err(e) => {
                        warn!(iscc = %iscc, error = %e, "Storage step failed");
                        StepOutcome::Failed(e.to_string())
                    }
                }
            }
        };

        let notification = match &self.notifier {
            None => {
                debug!(iscc = %iscc, "No notification service configured");
                StepOutcome::Skipped
            }
            Some(client) => {
                let content_type = media_type(job.content_type.as_deref(), &job.bytes);
                match client.notify(job.bytes.clone(), &content_type).await {
                    Ok(()) => {
                        info!(iscc = %iscc, content_type = %content_type, "Notification delivered");
                        StepOutcome::Done
                    }
                    Err(e) => {
                        warn!(iscc = %iscc, error = %e, "Notification step failed");
                        StepOutcome::Failed(e.to_string())
                    }
                }
            }
        };

        PersistenceReport {
            thumbnail,
            storage,
            notification,
        }
    }
}
