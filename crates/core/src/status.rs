//! Canonical job status vocabulary.
//!
//! Every upstream tier has its own status/progress/result schema; the rest of
//! the system only ever sees the types in this module.

use serde::{Deserialize, Serialize};

/// Canonical job status exposed to callers.
///
/// Decoupled from whatever vocabulary either upstream tier uses natively.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting in the upstream queue.
    Queued,
    /// Generation is in progress.
    Running,
    /// Generation finished; a result asset is available.
    Succeeded,
    /// Generation failed upstream.
    Failed,
    /// The upstream job timed out (terminal, equivalent to a failure).
    Timeout,
}

impl JobStatus {
    /// Terminal states end client polling.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Timeout
        )
    }
}

/// Result asset produced by a succeeded job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Download URL for the primary output format.
    pub url: String,
    /// Primary output format (e.g. `glb`).
    pub format: String,
    /// Size in bytes when the provider reports it, otherwise 0.
    pub size_bytes: u64,
    /// Download URL for an alternate output format, when one was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_format_url: Option<String>,
}

/// Provider response mapped onto the canonical shape.
///
/// Produced by the provider client; consumed by the orchestrator and merged
/// with registry metadata before reaching the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedStatus {
    /// Upstream task id the status refers to.
    pub task_id: String,
    pub status: JobStatus,
    /// Always within `[0, 1]`.
    pub progress: f32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
