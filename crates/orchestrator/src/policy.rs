//! Failover decision policy.

use std::time::Duration;

use meshrelay_registry::JobRecord;

/// Decides whether a running poll should switch a job to the secondary tier.
///
/// Pure configuration + decision function; holds no job state and touches no
/// clock or network. The orchestrator supplies the elapsed queue time.
#[derive(Debug, Clone)]
pub struct FailoverPolicy {
    /// Primary queue wait considered unacceptable.
    pub threshold: Duration,
    /// Developer-only switch that force-disables failover, for deterministic
    /// testing against the primary tier alone.
    pub disabled: bool,
}

impl Default for FailoverPolicy {
    fn default() -> Self {
        Self {
            threshold: Duration::from_secs(16),
            disabled: false,
        }
    }
}

impl FailoverPolicy {
    pub fn with_threshold(threshold: Duration) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// True iff a failover should be attempted on this poll.
    ///
    /// Requires all of: failover enabled, never attempted for this record,
    /// record not locked by an observed running state, and the elapsed queue
    /// time at or past the threshold.
    pub fn should_failover(&self, record: &JobRecord, elapsed_queue_ms: i64) -> bool {
        if self.disabled {
            return false;
        }
        if record.fallback.attempted {
            return false;
        }
        if record.fallback_locked {
            return false;
        }
        elapsed_queue_ms >= self.threshold.as_millis() as i64
    }
}
