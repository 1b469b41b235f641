//! Provider client trait and the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use meshrelay_core::{ImagePayload, NormalizedStatus, ProviderTier, Quality};

use crate::error::ProviderError;
use crate::normalize;

/// One upstream account: REST base URL plus bearer credential.
#[derive(Debug, Clone)]
pub struct TierConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Both tiers plus the bounded per-call timeout.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub primary: TierConfig,
    pub secondary: TierConfig,
    /// Upper bound on any single provider call. A timeout surfaces as
    /// [`ProviderError::Provider`], never as a silent retry.
    pub call_timeout: Duration,
}

/// Boundary to the upstream generation service.
///
/// Implementations perform the network call and translate the response; they
/// never retry and never touch registry state.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Submit an image for generation, returning the new upstream task id.
    async fn submit_job(
        &self,
        tier: ProviderTier,
        image: &ImagePayload,
        quality: Quality,
    ) -> Result<String, ProviderError>;

    /// Fetch and normalize the status of an upstream task.
    async fn query_status(
        &self,
        tier: ProviderTier,
        task_id: &str,
    ) -> Result<NormalizedStatus, ProviderError>;

    /// Start a format-conversion job for a completed task, returning the
    /// conversion task id (polled like any other task).
    async fn convert_asset(
        &self,
        tier: ProviderTier,
        task_id: &str,
        format: &str,
    ) -> Result<String, ProviderError>;
}

/// reqwest-backed [`ProviderClient`].
pub struct HttpProviderClient {
    http: reqwest::Client,
    settings: ProviderSettings,
}

impl HttpProviderClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(settings.call_timeout)
            .build()
            .map_err(|e| ProviderError::Provider(format!("http client init: {e}")))?;
        Ok(Self { http, settings })
    }

    fn tier(&self, tier: ProviderTier) -> &TierConfig {
        match tier {
            ProviderTier::Primary => &self.settings.primary,
            ProviderTier::Secondary => &self.settings.secondary,
        }
    }

    /// Secondary-tier upload leg: push the decoded image, get back a file
    /// token to reference in the task submission.
    async fn upload_image(
        &self,
        cfg: &TierConfig,
        image: &ImagePayload,
    ) -> Result<String, ProviderError> {
        let bytes = BASE64
            .decode(image.base64_body())
            .map_err(|e| ProviderError::Upload(format!("invalid base64 image: {e}")))?;

        let resp = self
            .http
            .post(format!("{}/upload", cfg.base_url))
            .bearer_auth(&cfg.api_key)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ProviderError::Upload(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, "image upload failed");
            return Err(ProviderError::Upload(format!("{status}: {detail}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Upload(e.to_string()))?;

        extract_upload_token(&body)
            .ok_or_else(|| ProviderError::Upload("upload response carried no file token".to_string()))
    }

    async fn create_task(
        &self,
        cfg: &TierConfig,
        payload: &Value,
    ) -> Result<String, ProviderError> {
        let resp = self
            .http
            .post(format!("{}/task", cfg.base_url))
            .bearer_auth(&cfg.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| ProviderError::Provider(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, "task creation rejected");
            return Err(ProviderError::Rejected {
                quota: status == reqwest::StatusCode::PAYMENT_REQUIRED,
                detail,
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Provider(e.to_string()))?;

        normalize::extract_task_id(&body).ok_or_else(|| {
            ProviderError::Provider("task creation response carried no task id".to_string())
        })
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn submit_job(
        &self,
        tier: ProviderTier,
        image: &ImagePayload,
        quality: Quality,
    ) -> Result<String, ProviderError> {
        let cfg = self.tier(tier);

        // Tiers differ in how the image travels: the primary tier accepts it
        // inline, the secondary wants an upload-then-reference two-step.
        let file_token = match tier {
            ProviderTier::Primary => image.base64_body().to_string(),
            ProviderTier::Secondary => self.upload_image(cfg, image).await?,
        };

        let payload = json!({
            "type": "image_to_model",
            "file": { "type": "png", "file_token": file_token },
            "quality": quality,
        });

        let task_id = self.create_task(cfg, &payload).await?;
        tracing::info!(?tier, task_id, "submitted generation job");
        Ok(task_id)
    }

    async fn query_status(
        &self,
        tier: ProviderTier,
        task_id: &str,
    ) -> Result<NormalizedStatus, ProviderError> {
        let cfg = self.tier(tier);

        let resp = self
            .http
            .get(format!("{}/task/{}", cfg.base_url, task_id))
            .bearer_auth(&cfg.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Provider(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, task_id, "status query failed");
            return Err(ProviderError::Provider(format!("{status}: {detail}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Provider(e.to_string()))?;

        Ok(normalize::normalize_response(tier, &body, task_id))
    }

    async fn convert_asset(
        &self,
        tier: ProviderTier,
        task_id: &str,
        format: &str,
    ) -> Result<String, ProviderError> {
        let cfg = self.tier(tier);

        let payload = json!({
            "type": "convert",
            "original_task_id": task_id,
            "format": format,
        });

        let conversion_id = self.create_task(cfg, &payload).await?;
        tracing::info!(?tier, task_id, conversion_id, format, "started conversion job");
        Ok(conversion_id)
    }
}

/// The upload endpoint has reported its token under several names; probe the
/// known locations in priority order.
fn extract_upload_token(body: &Value) -> Option<String> {
    const TOKEN_PATHS: &[&[&str]] = &[
        &["data", "image_token"],
        &["data", "token"],
        &["image_token"],
        &["token"],
    ];

    TOKEN_PATHS.iter().find_map(|path| {
        let mut current = body;
        for key in *path {
            current = current.get(key)?;
        }
        current.as_str().map(str::to_string)
    })
}
