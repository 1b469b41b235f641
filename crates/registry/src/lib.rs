//! `meshrelay-registry` — in-memory store of job lifecycle metadata.
//!
//! One record per client-visible job id. Records are created at submission
//! time, mutated by the status orchestrator, and reaped only by the age-based
//! expiry sweep. No durability: state is lost on process restart.

pub mod record;
pub mod store;

pub use record::{JobRecord, RecordPatch};
pub use store::{InMemoryJobRegistry, JobRegistry};
