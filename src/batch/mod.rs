//! Batch ingestion: the per-run orchestrator and its daily trigger.

mod orchestrator;
mod scheduler;

pub use orchestrator::{Orchestrator, RunPhase, RunReport};
pub use scheduler::{daily_cron, BatchScheduler, DAILY_JOB_NAME};
