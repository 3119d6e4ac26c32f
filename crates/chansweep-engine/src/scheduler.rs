//! Cron scheduler: fires cleanup ticks at configured local times.
//!
//! Occurrences are computed in the configured timezone, so a `04:00`
//! schedule stays at 04:00 local across daylight-saving transitions.

use crate::error::{EngineError, Result};
use chansweep_domain::config::ScheduleSettings;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::future::Future;
use tokio::task::JoinHandle;

/// Next occurrence of `schedule` after `after`, evaluated in `tz`.
pub fn next_occurrence(schedule: &Schedule, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule
        .after(&after.with_timezone(&tz))
        .next()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Background cron job driving scheduled cleanup ticks.
///
/// Reconfiguring replaces the job wholesale; the tick callback decides
/// what a tick does (and what to do when a run is already in flight).
#[derive(Debug, Default)]
pub struct Scheduler {
    job: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Create a scheduler with no job armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a job is currently armed.
    pub fn is_active(&self) -> bool {
        self.job.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Stop the armed job, if any.
    pub fn stop(&mut self) {
        if let Some(job) = self.job.take() {
            job.abort();
            tracing::info!("Scheduler stopped");
        }
    }

    /// Replace the armed job with one built from `settings`.
    ///
    /// The previous job is stopped first, so an invalid cron expression
    /// or timezone leaves the scheduler stopped rather than running a
    /// stale schedule.
    pub fn reconfigure<F, Fut>(&mut self, settings: &ScheduleSettings, tick: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        self.stop();
        if !settings.enabled {
            tracing::info!("Schedule disabled, scheduler not armed");
            return Ok(());
        }

        let schedule: Schedule = settings.cron.parse().map_err(|e| {
            EngineError::Schedule(format!("invalid cron expression {:?}: {e}", settings.cron))
        })?;
        let tz: Tz = settings
            .timezone
            .parse()
            .map_err(|_| EngineError::Schedule(format!("unknown timezone {:?}", settings.timezone)))?;

        tracing::info!(cron = %settings.cron, timezone = %tz, "Scheduler armed");
        self.job = Some(tokio::spawn(async move {
            loop {
                let Some(next) = next_occurrence(&schedule, tz, Utc::now()) else {
                    tracing::warn!("Schedule yields no future occurrence, scheduler stopping");
                    return;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tracing::debug!(next = %next, "Next scheduled cleanup");
                tokio::time::sleep(wait).await;
                tick().await;
            }
        }));
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
