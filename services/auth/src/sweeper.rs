//! Cron-driven session sweeps
//!
//! Used with [`SweepPolicy::External`](crate::session::SweepPolicy::External)
//! when expired sessions should be purged on a fixed schedule instead of
//! being triggered by login traffic.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::session::SessionRegistry;

/// Background job sweeping a registry on a cron schedule
pub struct SessionSweeper {
    scheduler: JobScheduler,
}

impl SessionSweeper {
    /// Start sweeping `registry` on `schedule` (six-field cron, seconds first)
    pub async fn start(registry: SessionRegistry, schedule: &str) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async(schedule, move |_, _| {
            let registry = registry.clone();
            Box::pin(async move {
                registry.sweep().await;
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Started session sweeper with schedule: {}", schedule);
        Ok(Self { scheduler })
    }

    /// Stop the scheduler; a sweep already running is left to finish
    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        info!("Session sweeper stopped");
        Ok(())
    }
}
