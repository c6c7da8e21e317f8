//! iscc-api library interface
//!
//! Exposes the router and application state for the binary and for
//! integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use iscc_common::UnitPool;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::error::DependencyError;
use crate::services::{
    AssetProcessor, NotificationClient, PersistencePipeline, RegistryClient, StorageClient,
    ThumbnailWriter,
};

/// Upload size limit for the multipart endpoint
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<AssetProcessor>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last request error for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(processor: AssetProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Wire the processor and its collaborators from resolved configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, DependencyError> {
        let pool = UnitPool::standard(config.workers, config.bits);

        let registry = config
            .registry_url
            .as_ref()
            .map(|url| RegistryClient::new(url.clone(), config.http_timeout))
            .transpose()?;
        let storage = config
            .storage_url
            .as_ref()
            .map(|url| StorageClient::new(url.clone(), config.http_timeout))
            .transpose()?;
        let notifier = config
            .notify_url
            .as_ref()
            .map(|url| NotificationClient::new(url.clone(), config.http_timeout))
            .transpose()?;

        let persistence = PersistencePipeline::new(
            ThumbnailWriter::new(config.thumbnail_dir.clone()),
            storage,
            notifier,
        );

        Ok(Self::new(AssetProcessor::new(
            pool,
            registry,
            persistence,
            config.compute_timeout,
        )))
    }

    pub async fn record_error(&self, error: &ApiError) {
        *self.last_error.write().await = Some(error.to_string());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::iscc_routes())
        .merge(api::explain_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
