//! Notification service client
//!
//! Sends the raw asset bytes downstream after an identifier was computed.
//! Only status 200 counts as delivered.

use std::time::Duration;

use bytes::Bytes;

use crate::error::DependencyError;

const SERVICE: &str = "notification";

/// Fallback media type when neither the upload nor the bytes tell us more
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Notification HTTP client
#[derive(Debug, Clone)]
pub struct NotificationClient {
    http_client: reqwest::Client,
    url: String,
}

impl NotificationClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DependencyError> {
        Ok(Self {
            http_client: super::build_http_client(SERVICE, timeout)?,
            url: url.into(),
        })
    }

    /// POST the raw bytes with the given media type
    pub async fn notify(&self, body: Bytes, content_type: &str) -> Result<(), DependencyError> {
        let response = self
            .http_client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| DependencyError::Transport {
                service: SERVICE,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            Ok(())
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

/// Media type for the notification body
///
/// Prefers the type declared on the upload, then sniffs the image format.
pub fn media_type(declared: Option<&str>, bytes: &[u8]) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        if declared != DEFAULT_CONTENT_TYPE {
            return declared.to_string();
        }
    }

    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| DEFAULT_CONTENT_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\0";

    #[test]
    fn test_media_type_prefers_declared() {
        assert_eq!(media_type(Some("image/webp"), PNG_MAGIC), "image/webp");
    }

    #[test]
    fn test_media_type_sniffs_generic_uploads() {
        assert_eq!(media_type(None, PNG_MAGIC), "image/png");
        assert_eq!(media_type(Some(DEFAULT_CONTENT_TYPE), PNG_MAGIC), "image/png");
        assert_eq!(media_type(None, b"plain bytes"), DEFAULT_CONTENT_TYPE);
    }
}
