//! `meshrelay-provider` — client for the upstream generation service.
//!
//! Purely a translation layer: submits jobs (per-tier submission protocols),
//! queries status, and maps raw provider responses onto the canonical
//! vocabulary in `meshrelay-core`. No retries happen here; retry policy
//! belongs to the orchestrator.

pub mod client;
pub mod error;
pub mod normalize;

pub use client::{HttpProviderClient, ProviderClient, ProviderSettings, TierConfig};
pub use error::ProviderError;
