//! `meshrelay-core` — shared vocabulary for the mesh-generation pipeline.
//!
//! This crate contains **pure domain** types (no I/O, no framework concerns):
//! the canonical job-status vocabulary, lifecycle metadata, and image payload
//! validation shared by the registry, provider client, orchestrator, and API.

pub mod image;
pub mod job;
pub mod status;

pub use image::{ImageError, ImagePayload};
pub use job::{FallbackInfo, FallbackReason, ProviderTier, Quality, Stage};
pub use status::{AssetInfo, JobStatus, NormalizedStatus};
