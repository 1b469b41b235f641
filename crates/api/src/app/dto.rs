//! Request DTOs.
//!
//! Responses reuse the orchestrator's serializable types (`CreatedJob`,
//! `StatusReport`); only requests need their own shapes here.

use serde::Deserialize;

use meshrelay_core::Quality;

#[derive(Debug, Deserialize)]
pub struct CreateMeshRequest {
    /// `data:image/...;base64,` payload. Validated in the handler so the
    /// caller gets a 400 with a reason, not a deserialization error.
    pub image: Option<String>,
    #[serde(default)]
    pub options: CreateMeshOptions,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateMeshOptions {
    #[serde(default)]
    pub quality: Quality,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertRequest {
    /// Target format; defaults to `usdz`.
    pub format: Option<String>,
}
