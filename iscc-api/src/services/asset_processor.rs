//! Asset processor
//!
//! Request path for one uploaded asset:
//! digest → registry lookup → unit fan-out → compose → detached persistence.
//!
//! A registry hit short-circuits everything after the lookup, persistence
//! included. Persistence tasks are spawned on a process-wide [`TaskTracker`]
//! and never awaited here; shutdown drains them.

use std::time::{Duration, Instant};

use bytes::Bytes;
use iscc_common::{compose, ByteSource, UnitPool};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::{PersistenceJob, PersistencePipeline, RegistryClient};
use crate::error::ApiResult;

/// One uploaded asset
#[derive(Debug, Clone)]
pub struct AssetSubmission {
    /// Source URL as given by the caller
    pub source_url: String,
    pub bytes: Bytes,
    /// Media type declared on the upload
    pub content_type: Option<String>,
}

/// Identifier returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub iscc: String,
    /// True when the identifier came from the registry
    pub dedup_hit: bool,
}

/// Computes identifiers and schedules their persistence
pub struct AssetProcessor {
    pool: UnitPool,
    registry: Option<RegistryClient>,
    persistence: PersistencePipeline,
    tasks: TaskTracker,
    compute_timeout: Duration,
}

impl AssetProcessor {
    pub fn new(
        pool: UnitPool,
        registry: Option<RegistryClient>,
        persistence: PersistencePipeline,
        compute_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            registry,
            persistence,
            tasks: TaskTracker::new(),
            compute_timeout,
        }
    }

    /// Tracker supervising detached persistence tasks
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    pub async fn process(&self, submission: AssetSubmission) -> ApiResult<ProcessOutcome> {
        let started = Instant::now();
        let source = ByteSource::new(submission.bytes);
        let digest = source.digest();

        if let Some(registry) = &self.registry {
            if let Some(iscc) = registry.lookup_by_digest(&digest).await {
                info!(digest = %digest, iscc = %iscc, "Returning registered identifier");
                return Ok(ProcessOutcome {
                    iscc,
                    dedup_hit: true,
                });
            }
        }

        let units = self
            .pool
            .compute_all_within(&source, self.compute_timeout)
            .await
            .map_err(|e| {
                warn!(digest = %digest, error = %e, "Unit computation failed");
                e
            })?;
        let composite = compose(&units.content, &units.data, &units.instance);

        info!(
            digest = %digest,
            iscc = %composite.value(),
            size = source.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Computed identifier"
        );

        let iscc = composite.value().to_string();
        let job = PersistenceJob {
            composite,
            digest,
            source_url: submission.source_url,
            bytes: source.bytes().clone(),
            content_type: submission.content_type,
        };
        let pipeline = self.persistence.clone();

        self.tasks.spawn(async move {
            let iscc = job.composite.value().to_string();
            let report = pipeline.run(job).await;
            if report.is_complete() {
                debug!(iscc = %iscc, ?report, "Persistence finished");
            } else {
                warn!(iscc = %iscc, ?report, "Persistence incomplete");
            }
        });

        Ok(ProcessOutcome {
            iscc,
            dedup_hit: false,
        })
    }
}
