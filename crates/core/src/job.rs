//! Job lifecycle metadata shared between the registry and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream account/tier a job runs against.
///
/// Both tiers are configurations of the same generation service; they differ
/// in cost, quality, and queue behavior. The secondary tier is only ever used
/// as a failover target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTier {
    Primary,
    Secondary,
}

/// Coarse lifecycle marker, informational for clients.
///
/// Also consulted to decide whether failover is still eligible.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Init,
    Queued,
    Fallback,
    Generating,
    Complete,
    Error,
}

/// Why a failover was attempted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackReason {
    QueueTimeout,
    PrimaryFailed,
}

/// Record of whether/why/when a failover occurred.
///
/// `attempted` is a one-shot latch: set exactly once, never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackInfo {
    pub attempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FallbackReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_at: Option<DateTime<Utc>>,
}

impl FallbackInfo {
    /// State of a freshly created job: no failover attempted.
    pub fn none() -> Self {
        Self {
            attempted: false,
            reason: None,
            attempted_at: None,
        }
    }

    /// Latched state after a failover.
    pub fn attempted(reason: FallbackReason, at: DateTime<Utc>) -> Self {
        Self {
            attempted: true,
            reason: Some(reason),
            attempted_at: Some(at),
        }
    }
}

/// Quality hint passed through to the upstream submission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Fast,
    High,
}
