//! Service layer for iscc-api
//!
//! HTTP clients for the external collaborators, the persistence pipeline and
//! the asset processor that ties them to the unit fan-out.

pub mod asset_processor;
pub mod notification_client;
pub mod persistence;
pub mod registry_client;
pub mod storage_client;
pub mod thumbnail;

pub use asset_processor::{AssetProcessor, ProcessOutcome};
pub use notification_client::NotificationClient;
pub use persistence::{PersistenceJob, PersistencePipeline, PersistenceReport};
pub use registry_client::RegistryClient;
pub use storage_client::{StorageClient, StorageRecord};
pub use thumbnail::ThumbnailWriter;

use std::time::Duration;

use crate::error::DependencyError;

const USER_AGENT: &str = concat!("iscc-api/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for the external services
pub fn build_http_client(
    service: &'static str,
    timeout: Duration,
) -> Result<reqwest::Client, DependencyError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| DependencyError::Transport {
            service,
            message: e.to_string(),
        })
}
