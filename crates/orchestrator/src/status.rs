//! Per-poll status resolution: the job-lifecycle state machine.
//!
//! Each `get_status` call is one step of the machine:
//! QUEUED →(failover)→ QUEUED(fallback) →(upstream running)→ RUNNING(locked)
//! → {SUCCEEDED, FAILED, TIMEOUT}. QUEUED may also go straight to RUNNING.
//! Once locked or terminal, repeated polls are idempotent re-reads.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use meshrelay_core::{
    FallbackInfo, FallbackReason, JobStatus, NormalizedStatus, ProviderTier, Quality, Stage,
};
use meshrelay_provider::{ProviderClient, ProviderError, normalize};
use meshrelay_registry::{JobRecord, JobRegistry, RecordPatch};

use crate::policy::FailoverPolicy;

/// Status payload returned to callers: the normalized upstream status merged
/// with registry metadata. Metadata fields are absent for untracked ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[serde(flatten)]
    pub status: NormalizedStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_wait_ms: Option<i64>,
}

/// Poll failure surfaced to the caller.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Unknown to both the registry and the upstream provider. Definitive;
    /// callers should stop polling.
    #[error("job not found")]
    NotFound,

    /// Upstream failure with no tracked record to fall back on.
    #[error(transparent)]
    Provider(ProviderError),
}

/// Resolves job status, applies the failover policy, and owns every registry
/// mutation after creation.
pub struct Orchestrator {
    pub(crate) registry: Arc<dyn JobRegistry>,
    pub(crate) provider: Arc<dyn ProviderClient>,
    pub(crate) policy: FailoverPolicy,
    pub(crate) retention: Duration,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        provider: Arc<dyn ProviderClient>,
        policy: FailoverPolicy,
    ) -> Self {
        Self {
            registry,
            provider,
            policy,
            retention: Duration::from_secs(60 * 60),
        }
    }

    /// Registry retention window used by the opportunistic expiry sweep.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub async fn get_status(&self, job_id: &str) -> Result<StatusReport, StatusError> {
        let Some(record) = self.registry.get(job_id) else {
            return self.untracked_status(job_id).await;
        };

        let upstream = self
            .provider
            .query_status(record.provider, &record.task_id)
            .await;

        let status = match upstream {
            Ok(status) => status,
            // Definitive: no failover on this path, the caller stops polling.
            Err(ProviderError::NotFound) => return Err(StatusError::NotFound),
            Err(e) => {
                tracing::warn!(job_id, error = %e, "upstream query failed; serving last-known state");
                return Ok(self.degraded_report(&record));
            }
        };

        match status.status {
            JobStatus::Queued => Ok(self.on_queued(job_id, record, status).await),
            JobStatus::Running => Ok(self.on_running(job_id, record, status)),
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Timeout => {
                Ok(self.on_terminal(job_id, record, status))
            }
        }
    }

    /// Ids with no registry record (created before this process started, or
    /// already expired) are polled directly against the primary tier and
    /// returned without job metadata.
    async fn untracked_status(&self, job_id: &str) -> Result<StatusReport, StatusError> {
        let status = self
            .provider
            .query_status(ProviderTier::Primary, job_id)
            .await
            .map_err(|e| match e {
                ProviderError::NotFound => StatusError::NotFound,
                other => StatusError::Provider(other),
            })?;

        Ok(StatusReport {
            status,
            provider: None,
            stage: None,
            fallback: None,
            queue_wait_ms: None,
        })
    }

    async fn on_queued(
        &self,
        job_id: &str,
        record: JobRecord,
        status: NormalizedStatus,
    ) -> StatusReport {
        let elapsed = self.registry.elapsed_queue_ms(&record);

        if self.policy.should_failover(&record, elapsed) {
            match self.attempt_failover(&record).await {
                Ok(new_task_id) => return self.after_failover(job_id, &record, new_task_id).await,
                // The attempted latch is only set on success, so the next
                // poll gets another try.
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "failover attempt failed; retrying on a later poll");
                }
            }
        }

        let record = if record.stage == Stage::Init {
            self.registry
                .update(job_id, RecordPatch::stage(Stage::Queued))
                .unwrap_or(record)
        } else {
            record
        };

        merged_report(status, &record, elapsed)
    }

    /// Swap the record to the secondary job and answer with the new
    /// upstream's view, so the caller polls the right task going forward.
    async fn after_failover(
        &self,
        job_id: &str,
        old: &JobRecord,
        new_task_id: String,
    ) -> StatusReport {
        let now = Utc::now();
        let fallback = FallbackInfo::attempted(FallbackReason::QueueTimeout, now);
        let record = self
            .registry
            .update(
                job_id,
                RecordPatch {
                    task_id: Some(new_task_id.clone()),
                    provider: Some(ProviderTier::Secondary),
                    stage: Some(Stage::Fallback),
                    fallback: Some(fallback.clone()),
                    ..RecordPatch::default()
                },
            )
            .unwrap_or_else(|| {
                // The record was reaped mid-poll; answer from a local copy so
                // the caller still learns the new task id.
                let mut record = old.clone();
                record.task_id = new_task_id.clone();
                record.provider = ProviderTier::Secondary;
                record.stage = Stage::Fallback;
                record.fallback = fallback;
                record
            });

        tracing::info!(job_id, new_task_id, "failed over to secondary tier");

        match self
            .provider
            .query_status(ProviderTier::Secondary, &new_task_id)
            .await
        {
            Ok(status) => {
                merged_report(status, &record, self.registry.elapsed_queue_ms(&record))
            }
            Err(e) => {
                tracing::warn!(job_id, error = %e, "fresh query after failover failed");
                self.degraded_report(&record)
            }
        }
    }

    fn on_running(
        &self,
        job_id: &str,
        record: JobRecord,
        status: NormalizedStatus,
    ) -> StatusReport {
        // Lock is monotonic; only the first observation transitions anything.
        let record = if record.fallback_locked {
            record
        } else {
            self.registry
                .update(job_id, RecordPatch::lock_fallback())
                .unwrap_or(record)
        };

        let elapsed = self.registry.elapsed_queue_ms(&record);
        merged_report(status, &record, elapsed)
    }

    fn on_terminal(
        &self,
        job_id: &str,
        record: JobRecord,
        mut status: NormalizedStatus,
    ) -> StatusReport {
        let stage = if status.status == JobStatus::Succeeded {
            Stage::Complete
        } else {
            Stage::Error
        };

        let record = self
            .registry
            .update(job_id, RecordPatch::stage(stage))
            .unwrap_or_else(|| {
                let mut record = record;
                record.stage = stage;
                record
            });

        // Terminal failures always carry a human-readable error string.
        if status.status != JobStatus::Succeeded && status.error.is_none() {
            status.error = Some(status.message.clone());
        }

        let elapsed = self.registry.elapsed_queue_ms(&record);
        merged_report(status, &record, elapsed)
    }

    /// Best-effort response synthesized from the last-known record state,
    /// used when the upstream query fails transiently mid-poll. The caller
    /// will simply poll again.
    fn degraded_report(&self, record: &JobRecord) -> StatusReport {
        let (status, progress) = match record.stage {
            Stage::Init | Stage::Queued | Stage::Fallback => (JobStatus::Queued, 0.0),
            Stage::Generating => (JobStatus::Running, 0.0),
            Stage::Complete => (JobStatus::Succeeded, 1.0),
            Stage::Error => (JobStatus::Failed, 0.0),
        };
        let message = normalize::status_message(status, progress);

        let normalized = NormalizedStatus {
            task_id: record.task_id.clone(),
            status,
            progress,
            message: message.clone(),
            asset: None,
            error: (status == JobStatus::Failed).then_some(message),
        };

        merged_report(normalized, record, self.registry.elapsed_queue_ms(record))
    }

    /// Re-submit the retained image to the secondary tier at its highest
    /// quality. Any failure means "could not fail over this round".
    async fn attempt_failover(&self, record: &JobRecord) -> Result<String, FailoverError> {
        let image = record
            .original_image
            .as_ref()
            .ok_or(FailoverError::MissingImage)?;

        let task_id = self
            .provider
            .submit_job(ProviderTier::Secondary, image, Quality::High)
            .await?;
        Ok(task_id)
    }
}

#[derive(Debug, Error)]
enum FailoverError {
    #[error("no retained image to resubmit")]
    MissingImage,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn merged_report(status: NormalizedStatus, record: &JobRecord, queue_wait_ms: i64) -> StatusReport {
    StatusReport {
        status,
        provider: Some(record.provider),
        stage: Some(record.stage),
        fallback: Some(record.fallback.clone()),
        queue_wait_ms: Some(queue_wait_ms),
    }
}
