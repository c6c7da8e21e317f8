//! Fan-out/fan-in unit computation
//!
//! One asset's three units are computed concurrently and joined; the first
//! failure fails the whole set, so callers never see a partial triple.
//!
//! Unit computation is CPU bound and runs on tokio's blocking threads. A
//! process-wide semaphore bounds how many of those run at once across all
//! concurrent requests; it holds no per-request state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::compose::{compose, CompositeIdentifier, UnitTriple};
use crate::config::UnitBits;
use crate::source::ByteSource;
use crate::units::{ComputationError, StandardUnits, UnitCode, UnitComputer, UnitKind};

/// Shared, bounded pool for unit computations
#[derive(Clone)]
pub struct UnitPool {
    computer: Arc<dyn UnitComputer>,
    permits: Arc<Semaphore>,
    bits: UnitBits,
}

impl UnitPool {
    /// Create a pool running at most `workers` unit computations at once
    pub fn new(computer: Arc<dyn UnitComputer>, workers: usize, bits: UnitBits) -> Self {
        Self {
            computer,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            bits,
        }
    }

    /// Pool backed by the built-in unit computations
    pub fn standard(workers: usize, bits: UnitBits) -> Self {
        Self::new(Arc::new(StandardUnits), workers, bits)
    }

    pub fn bits(&self) -> UnitBits {
        self.bits
    }

    /// Compute one unit on a blocking worker
    pub async fn compute(
        &self,
        kind: UnitKind,
        source: ByteSource,
    ) -> Result<UnitCode, ComputationError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ComputationError::WorkerFailed("unit pool closed".to_string()))?;

        let computer = Arc::clone(&self.computer);
        let bits = self.bits.for_kind(kind);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            computer.compute_unit(kind, &source, bits)
        })
        .await
        .map_err(|e| ComputationError::WorkerFailed(format!("{} unit task failed: {}", kind, e)))?
    }

    /// Compute all three units concurrently; all or nothing
    pub async fn compute_all(&self, source: &ByteSource) -> Result<UnitTriple, ComputationError> {
        let (content, data, instance) = tokio::try_join!(
            self.compute(UnitKind::Content, source.clone()),
            self.compute(UnitKind::Data, source.clone()),
            self.compute(UnitKind::Instance, source.clone()),
        )?;

        tracing::debug!(
            content = %content.code(),
            data = %data.code(),
            instance = %instance.code(),
            "Unit fan-out joined"
        );

        Ok(UnitTriple {
            content,
            data,
            instance,
        })
    }

    /// Like [`compute_all`](Self::compute_all) but fails as a unit after `timeout`
    pub async fn compute_all_within(
        &self,
        source: &ByteSource,
        timeout: Duration,
    ) -> Result<UnitTriple, ComputationError> {
        tokio::time::timeout(timeout, self.compute_all(source))
            .await
            .map_err(|_| ComputationError::Timeout(timeout.as_millis() as u64))?
    }

    /// Compute and compose the composite identifier for `source`
    pub async fn identify(
        &self,
        source: &ByteSource,
    ) -> Result<CompositeIdentifier, ComputationError> {
        let units = self.compute_all(source).await?;
        Ok(compose(&units.content, &units.data, &units.instance))
    }
}
