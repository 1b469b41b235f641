//! Scripted test doubles shared by the orchestrator tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use meshrelay_core::{ImagePayload, JobStatus, NormalizedStatus, ProviderTier, Quality};
use meshrelay_provider::{ProviderClient, ProviderError};

pub(crate) fn image() -> ImagePayload {
    ImagePayload::from_data_url("data:image/png;base64,aGVsbG8=", 1024).unwrap()
}

pub(crate) fn status(task_id: &str, status: JobStatus) -> NormalizedStatus {
    NormalizedStatus {
        task_id: task_id.to_string(),
        status,
        progress: if status == JobStatus::Succeeded { 1.0 } else { 0.0 },
        message: String::new(),
        asset: None,
        error: None,
    }
}

/// Scripted provider: per-task status queues and submission/conversion
/// outcome queues. The last entry of a queue is sticky, so a single scripted
/// value answers any number of polls.
#[derive(Default)]
pub(crate) struct FakeProvider {
    statuses: Mutex<HashMap<String, VecDeque<Result<NormalizedStatus, ProviderError>>>>,
    submissions: Mutex<VecDeque<Result<String, ProviderError>>>,
    conversions: Mutex<VecDeque<Result<String, ProviderError>>>,
    /// Tier/quality of every submission made, in order.
    pub(crate) submitted: Mutex<Vec<(ProviderTier, Quality)>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_status(
        &self,
        task_id: &str,
        result: Result<NormalizedStatus, ProviderError>,
    ) {
        self.statuses
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .push_back(result);
    }

    /// Replace the script for `task_id` with a single sticky result.
    pub(crate) fn set_status(
        &self,
        task_id: &str,
        result: Result<NormalizedStatus, ProviderError>,
    ) {
        let mut statuses = self.statuses.lock().unwrap();
        let queue = statuses.entry(task_id.to_string()).or_default();
        queue.clear();
        queue.push_back(result);
    }

    pub(crate) fn push_submission(&self, result: Result<String, ProviderError>) {
        self.submissions.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_conversion(&self, result: Result<String, ProviderError>) {
        self.conversions.lock().unwrap().push_back(result);
    }
}

fn take_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    match queue.len() {
        0 => None,
        1 => queue.front().cloned(),
        _ => queue.pop_front(),
    }
}

#[async_trait]
impl ProviderClient for FakeProvider {
    async fn submit_job(
        &self,
        tier: ProviderTier,
        _image: &ImagePayload,
        quality: Quality,
    ) -> Result<String, ProviderError> {
        self.submitted.lock().unwrap().push((tier, quality));
        take_sticky(&mut self.submissions.lock().unwrap())
            .unwrap_or_else(|| Err(ProviderError::Provider("no scripted submission".to_string())))
    }

    async fn query_status(
        &self,
        _tier: ProviderTier,
        task_id: &str,
    ) -> Result<NormalizedStatus, ProviderError> {
        let mut statuses = self.statuses.lock().unwrap();
        match statuses.get_mut(task_id) {
            Some(queue) => take_sticky(queue).unwrap_or(Err(ProviderError::NotFound)),
            None => Err(ProviderError::NotFound),
        }
    }

    async fn convert_asset(
        &self,
        _tier: ProviderTier,
        _task_id: &str,
        _format: &str,
    ) -> Result<String, ProviderError> {
        take_sticky(&mut self.conversions.lock().unwrap())
            .unwrap_or_else(|| Err(ProviderError::Provider("no scripted conversion".to_string())))
    }
}
