//! Job creation and conversion entrypoints.

use serde::{Deserialize, Serialize};

use meshrelay_core::{ImagePayload, JobStatus, ProviderTier, Quality};
use meshrelay_provider::ProviderError;

use crate::status::Orchestrator;

/// ETA hint returned at submission time; the upstream reports none.
const ETA_SECONDS: u32 = 60;

/// Outcome of a successful job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedJob {
    /// Client-visible job id; stable across any later failover.
    pub task_id: String,
    pub status: JobStatus,
    pub eta_seconds: u32,
}

impl Orchestrator {
    /// Submit a validated image to the primary tier and register the job.
    ///
    /// Also the hook for the age-based registry sweep: with no background
    /// scheduler in the process, old records are reaped here.
    pub async fn create_job(
        &self,
        image: ImagePayload,
        quality: Quality,
    ) -> Result<CreatedJob, ProviderError> {
        self.registry.expire_older_than(self.retention);

        let task_id = self
            .provider
            .submit_job(ProviderTier::Primary, &image, quality)
            .await?;
        self.registry
            .create(&task_id, ProviderTier::Primary, Some(image));
        tracing::info!(task_id, "created generation job");

        Ok(CreatedJob {
            task_id,
            status: JobStatus::Queued,
            eta_seconds: ETA_SECONDS,
        })
    }

    /// Start a format conversion (e.g. USDZ) for a job's completed output.
    ///
    /// Tracked ids convert the upstream task the record currently points at;
    /// unknown ids are passed through as raw upstream ids, mirroring the
    /// status path. Returns the conversion task id, polled like any other.
    pub async fn convert_job(&self, job_id: &str, format: &str) -> Result<String, ProviderError> {
        let (tier, task_id) = match self.registry.get(job_id) {
            Some(record) => (record.provider, record.task_id),
            None => (ProviderTier::Primary, job_id.to_string()),
        };

        self.provider.convert_asset(tier, &task_id, format).await
    }
}
