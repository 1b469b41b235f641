//! Job record and partial-update types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meshrelay_core::{FallbackInfo, ImagePayload, ProviderTier, Stage};

/// Metadata tracked for a single client-visible job.
///
/// `task_id` always refers to the upstream job the orchestrator should
/// currently poll; after a failover it is replaced together with `provider`
/// and `stage` in a single registry update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Upstream task id currently associated with this record.
    pub task_id: String,
    /// Which tier is authoritative right now.
    pub provider: ProviderTier,
    pub stage: Stage,
    /// Set once at creation; the sole reference point for elapsed-queue-time
    /// calculations. Not reset on failover.
    pub queue_started_at: DateTime<Utc>,
    /// Monotonic: once true, failover can never trigger again.
    pub fallback_locked: bool,
    pub fallback: FallbackInfo,
    /// Retained so a failover resubmission is possible without asking the
    /// client to resend the image.
    pub original_image: Option<ImagePayload>,
}

impl JobRecord {
    pub fn new(
        task_id: impl Into<String>,
        provider: ProviderTier,
        original_image: Option<ImagePayload>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            provider,
            stage: Stage::Init,
            queue_started_at: Utc::now(),
            fallback_locked: false,
            fallback: FallbackInfo::none(),
            original_image,
        }
    }

    /// Shallow-merge a patch into this record.
    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(task_id) = patch.task_id {
            self.task_id = task_id;
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(locked) = patch.fallback_locked {
            self.fallback_locked = locked;
        }
        if let Some(fallback) = patch.fallback {
            self.fallback = fallback;
        }
    }
}

/// Partial update for a [`JobRecord`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub task_id: Option<String>,
    pub provider: Option<ProviderTier>,
    pub stage: Option<Stage>,
    pub fallback_locked: Option<bool>,
    pub fallback: Option<FallbackInfo>,
}

impl RecordPatch {
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn lock_fallback() -> Self {
        Self {
            fallback_locked: Some(true),
            stage: Some(Stage::Generating),
            ..Self::default()
        }
    }
}
