//! Upstream communication error taxonomy.

use thiserror::Error;

/// Failure talking to the upstream generation service.
///
/// Variants are deliberately coarse: callers branch on *kind* (quota vs
/// generic rejection, not-found vs transient), never on provider wording.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The image-upload leg of a submission failed.
    #[error("image upload failed: {0}")]
    Upload(String),

    /// The provider's job-creation call returned a non-success status.
    #[error("provider rejected the job: {detail}")]
    Rejected {
        /// True when the rejection is a quota/credits exhaustion.
        quota: bool,
        detail: String,
    },

    /// The provider reports the task as unknown (404-equivalent).
    ///
    /// Definitive: callers should stop polling instead of retrying.
    #[error("upstream task not found")]
    NotFound,

    /// Any other non-success, including bounded-call timeouts.
    #[error("provider error: {0}")]
    Provider(String),
}

impl ProviderError {
    pub fn is_quota(&self) -> bool {
        matches!(self, ProviderError::Rejected { quota: true, .. })
    }
}
