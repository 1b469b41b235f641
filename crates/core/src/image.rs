//! Inbound image payload validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a submitted image.
///
/// Never retried; surfaced immediately to the caller with an actionable
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("missing or invalid image: expected a data:image/... payload")]
    Invalid,

    #[error("image too large: {size_bytes} bytes exceeds the {max_bytes} byte limit")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
}

/// A validated base64 image, as submitted by the client.
///
/// Retained on the job record so a failover resubmission is possible without
/// asking the client to resend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload {
    data_url: String,
}

impl ImagePayload {
    /// Validate a `data:image/...;base64,` URL against a size cap.
    ///
    /// Decoded size is estimated from the base64 body length; the payload is
    /// not decoded here.
    pub fn from_data_url(data_url: impl Into<String>, max_bytes: u64) -> Result<Self, ImageError> {
        let data_url = data_url.into();
        if !data_url.starts_with("data:image/") {
            return Err(ImageError::Invalid);
        }

        let size_bytes = estimate_decoded_size(base64_body(&data_url));
        if size_bytes > max_bytes {
            return Err(ImageError::TooLarge {
                size_bytes,
                max_bytes,
            });
        }

        Ok(Self { data_url })
    }

    /// Base64 body with the `data:...;base64,` prefix stripped.
    pub fn base64_body(&self) -> &str {
        base64_body(&self.data_url)
    }

    /// Estimated decoded size in bytes.
    pub fn size_bytes(&self) -> u64 {
        estimate_decoded_size(self.base64_body())
    }
}

fn base64_body(data_url: &str) -> &str {
    match data_url.split_once(',') {
        Some((_, body)) => body,
        None => data_url,
    }
}

fn estimate_decoded_size(base64: &str) -> u64 {
    (base64.len() as u64 * 3) / 4
}
