//! Registry storage implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;

use meshrelay_core::{ImagePayload, ProviderTier};

use super::record::{JobRecord, RecordPatch};

/// Store abstraction for job records.
///
/// Single logical owner per process; no transactional guarantees across
/// concurrent updates to the same id (last-write-wins). A lost update only
/// costs a redundant failover check on the next poll.
pub trait JobRegistry: Send + Sync {
    /// Register a freshly submitted job. Always succeeds.
    fn create(
        &self,
        task_id: &str,
        provider: ProviderTier,
        original_image: Option<ImagePayload>,
    ) -> JobRecord;

    /// Pure lookup. `None` is an expected outcome (expired or unknown id).
    fn get(&self, id: &str) -> Option<JobRecord>;

    /// Shallow-merge `patch` into the record. Returns `None` if the id is
    /// unknown; callers must treat that as non-fatal.
    fn update(&self, id: &str, patch: RecordPatch) -> Option<JobRecord>;

    /// Milliseconds spent since the record entered the queue, recomputed on
    /// every call.
    fn elapsed_queue_ms(&self, record: &JobRecord) -> i64 {
        (Utc::now() - record.queue_started_at).num_milliseconds()
    }

    /// Remove all records whose `queue_started_at` predates the cutoff.
    fn expire_older_than(&self, max_age: Duration);
}

/// In-memory registry; the default (and only) backing store.
#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    records: RwLock<HashMap<String, JobRecord>>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

impl JobRegistry for InMemoryJobRegistry {
    fn create(
        &self,
        task_id: &str,
        provider: ProviderTier,
        original_image: Option<ImagePayload>,
    ) -> JobRecord {
        let record = JobRecord::new(task_id, provider, original_image);
        self.records
            .write()
            .unwrap()
            .insert(task_id.to_string(), record.clone());
        tracing::debug!(task_id, ?provider, "registered job");
        record
    }

    fn get(&self, id: &str) -> Option<JobRecord> {
        self.records.read().unwrap().get(id).cloned()
    }

    fn update(&self, id: &str, patch: RecordPatch) -> Option<JobRecord> {
        let mut records = self.records.write().unwrap();
        match records.get_mut(id) {
            Some(record) => {
                record.apply(patch);
                Some(record.clone())
            }
            None => {
                tracing::debug!(id, "update for unknown job id ignored");
                None
            }
        }
    }

    fn expire_older_than(&self, max_age: Duration) {
        let cutoff = Utc::now() - chrono::Duration::from_std(max_age).unwrap_or_default();
        let mut records = self.records.write().unwrap();
        let before = records.len();
        records.retain(|_, record| record.queue_started_at >= cutoff);
        let removed = before - records.len();
        if removed > 0 {
            tracing::debug!(removed, "expired old job records");
        }
    }
}

impl JobRegistry for Arc<InMemoryJobRegistry> {
    fn create(
        &self,
        task_id: &str,
        provider: ProviderTier,
        original_image: Option<ImagePayload>,
    ) -> JobRecord {
        (**self).create(task_id, provider, original_image)
    }

    fn get(&self, id: &str) -> Option<JobRecord> {
        (**self).get(id)
    }

    fn update(&self, id: &str, patch: RecordPatch) -> Option<JobRecord> {
        (**self).update(id, patch)
    }

    fn expire_older_than(&self, max_age: Duration) {
        (**self).expire_older_than(max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshrelay_core::{FallbackInfo, FallbackReason, Stage};

    #[test]
    fn create_then_get_round_trips() {
        let registry = InMemoryJobRegistry::new();
        let created = registry.create("task-1", ProviderTier::Primary, None);

        let fetched = registry.get("task-1").unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.stage, Stage::Init);
    }

    #[test]
    fn get_unknown_id_is_none() {
        let registry = InMemoryJobRegistry::new();
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn update_merges_and_returns_the_record() {
        let registry = InMemoryJobRegistry::new();
        registry.create("task-1", ProviderTier::Primary, None);

        let updated = registry
            .update("task-1", RecordPatch::stage(Stage::Queued))
            .unwrap();
        assert_eq!(updated.stage, Stage::Queued);
        assert_eq!(registry.get("task-1").unwrap().stage, Stage::Queued);
    }

    #[test]
    fn update_unknown_id_is_quietly_none() {
        let registry = InMemoryJobRegistry::new();
        assert!(
            registry
                .update("nope", RecordPatch::stage(Stage::Queued))
                .is_none()
        );
    }

    #[test]
    fn failover_swap_is_a_single_update() {
        let registry = InMemoryJobRegistry::new();
        registry.create("task-1", ProviderTier::Primary, None);

        registry.update(
            "task-1",
            RecordPatch {
                task_id: Some("task-2".to_string()),
                provider: Some(ProviderTier::Secondary),
                stage: Some(Stage::Fallback),
                fallback: Some(FallbackInfo::attempted(
                    FallbackReason::QueueTimeout,
                    Utc::now(),
                )),
                ..RecordPatch::default()
            },
        );

        // The record stays addressable under the client-visible id while the
        // upstream task id it polls has moved.
        let record = registry.get("task-1").unwrap();
        assert_eq!(record.task_id, "task-2");
        assert_eq!(record.provider, ProviderTier::Secondary);
        assert_eq!(record.stage, Stage::Fallback);
        assert!(record.fallback.attempted);
    }

    #[test]
    fn elapsed_queue_ms_is_non_negative_and_recomputed() {
        let registry = InMemoryJobRegistry::new();
        let record = registry.create("task-1", ProviderTier::Primary, None);

        let first = registry.elapsed_queue_ms(&record);
        assert!(first >= 0);
        let second = registry.elapsed_queue_ms(&record);
        assert!(second >= first);
    }

    #[test]
    fn expire_removes_only_records_past_the_cutoff() {
        let registry = InMemoryJobRegistry::new();
        registry.create("old", ProviderTier::Primary, None);
        registry.create("new", ProviderTier::Primary, None);

        // Age the first record past a one-hour retention window.
        {
            let mut records = registry.records.write().unwrap();
            records.get_mut("old").unwrap().queue_started_at =
                Utc::now() - chrono::Duration::hours(2);
        }

        registry.expire_older_than(Duration::from_secs(60 * 60));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("old").is_none());
        assert!(registry.get("new").is_some());
    }
}
