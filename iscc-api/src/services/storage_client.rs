//! Storage service client
//!
//! Posts one metadata record per computed identifier. Any 2xx status counts as
//! stored; everything else is a logged failure and is never retried.

use std::time::Duration;

use iscc_common::{CompositeIdentifier, ContentDigest};
use serde::{Deserialize, Serialize};

use crate::error::DependencyError;

const SERVICE: &str = "storage";

/// Metadata record sent to the storage service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub iscc: String,
    /// SHA-256 of the asset bytes
    pub hash: String,
    #[serde(rename = "content-code-hex")]
    pub content_code_hex: String,
    #[serde(rename = "data-code-hex")]
    pub data_code_hex: String,
    #[serde(rename = "instance-code-hex")]
    pub instance_code_hex: String,
    #[serde(rename = "content-code-log")]
    pub content_code_log: String,
    #[serde(rename = "data-code-log")]
    pub data_code_log: String,
    #[serde(rename = "instance-code-log")]
    pub instance_code_log: String,
    /// Originating source URL as given by the caller
    pub source: String,
}

impl StorageRecord {
    pub fn new(composite: &CompositeIdentifier, digest: &ContentDigest, source: &str) -> Self {
        let units = composite.constituents();
        Self {
            iscc: composite.value().to_string(),
            hash: digest.to_string(),
            content_code_hex: units.content.hex_digest(),
            data_code_hex: units.data.hex_digest(),
            instance_code_hex: units.instance.hex_digest(),
            content_code_log: units.content.log10(),
            data_code_log: units.data.log10(),
            instance_code_log: units.instance.log10(),
            source: source.to_string(),
        }
    }
}

/// Storage HTTP client
#[derive(Debug, Clone)]
pub struct StorageClient {
    http_client: reqwest::Client,
    url: String,
}

impl StorageClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DependencyError> {
        Ok(Self {
            http_client: super::build_http_client(SERVICE, timeout)?,
            url: url.into(),
        })
    }

    /// POST the record; returns the status on success
    pub async fn store(&self, record: &StorageRecord) -> Result<u16, DependencyError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|e| DependencyError::Transport {
                service: SERVICE,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DependencyError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            })
        }
    }
}
