//! Recurring trigger for ingestion runs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::orchestrator::Orchestrator;
use crate::config::ScheduleConfig;
use crate::{BatcherError, Result};

/// Name of the daily ingestion job.
pub const DAILY_JOB_NAME: &str = "daily_news_batch";

/// Build the six-field cron expression firing daily at `hour:minute`.
pub fn daily_cron(hour: u32, minute: u32) -> String {
    format!("0 {minute} {hour} * * *")
}

/// Cron-based scheduler owning the daily ingestion job.
pub struct BatchScheduler {
    scheduler: JobScheduler,
    config: ScheduleConfig,
    orchestrator: Arc<Orchestrator>,
}

impl BatchScheduler {
    /// Create a scheduler. No job is registered until [`start`](Self::start).
    pub async fn new(config: ScheduleConfig, orchestrator: Arc<Orchestrator>) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler,
            config,
            orchestrator,
        })
    }

    /// Register the daily job and start ticking.
    ///
    /// Does nothing when the schedule is disabled.
    pub async fn start(&mut self) -> Result<()> {
        if !self.config.enabled {
            info!("Batch schedule disabled");
            return Ok(());
        }

        let timezone: chrono_tz::Tz = self.config.timezone.parse().map_err(|_| {
            BatcherError::Config(format!("unknown schedule.timezone: {}", self.config.timezone))
        })?;
        let cron = daily_cron(self.config.hour, self.config.minute);
        let limit = self.config.limit;
        let orchestrator = Arc::clone(&self.orchestrator);

        let job = Job::new_async_tz(cron.as_str(), timezone, move |_uuid, _lock| {
            let orchestrator = Arc::clone(&orchestrator);
            Box::pin(async move {
                info!(job = DAILY_JOB_NAME, "Scheduled batch triggered");
                if let Err(e) = orchestrator.run_once(limit).await {
                    error!(job = DAILY_JOB_NAME, "Scheduled batch failed: {}", e);
                }
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        info!(
            job = DAILY_JOB_NAME,
            cron = %cron,
            timezone = %timezone,
            limit,
            "Batch scheduler started (daily at {:02}:{:02})",
            self.config.hour,
            self.config.minute
        );
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        info!("Batch scheduler stopped");
        Ok(())
    }
}
