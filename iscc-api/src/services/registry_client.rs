//! Registry lookup client
//!
//! Read-only digest lookup against the external registry. The registry answers
//! `GET <base>?digest=<sha256 hex>` with a JSON object; a `data.iscc` field
//! means the asset was seen before.

use std::time::Duration;

use iscc_common::ContentDigest;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::DependencyError;

const SERVICE: &str = "registry";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    data: Option<LookupData>,
}

#[derive(Debug, Deserialize)]
struct LookupData {
    iscc: Option<String>,
}

/// Registry HTTP client
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DependencyError> {
        Ok(Self {
            http_client: super::build_http_client(SERVICE, timeout)?,
            base_url: base_url.into(),
        })
    }

    /// Look up a previously computed identifier by digest
    ///
    /// Never fails: any transport, status or decoding problem is logged and
    /// reported as a miss.
    pub async fn lookup_by_digest(&self, digest: &ContentDigest) -> Option<String> {
        match self.try_lookup(digest).await {
            Ok(Some(iscc)) => {
                debug!(digest = %digest, iscc = %iscc, "Registry hit");
                Some(iscc)
            }
            Ok(None) => {
                debug!(digest = %digest, "Registry miss");
                None
            }
            Err(e) => {
                warn!(digest = %digest, error = %e, "Registry lookup failed, treating as miss");
                None
            }
        }
    }

    async fn try_lookup(&self, digest: &ContentDigest) -> Result<Option<String>, DependencyError> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("digest", digest.as_str())])
            .send()
            .await
            .map_err(|e| DependencyError::Transport {
                service: SERVICE,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DependencyError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: LookupResponse =
            response
                .json()
                .await
                .map_err(|e| DependencyError::Response {
                    service: SERVICE,
                    message: e.to_string(),
                })?;

        Ok(parsed
            .data
            .and_then(|d| d.iscc)
            .filter(|iscc| !iscc.is_empty()))
    }
}
