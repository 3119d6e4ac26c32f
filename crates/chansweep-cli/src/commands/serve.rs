//! Serve command implementation: foreground scheduler loop.

use crate::error::Result;
use crate::output::Formatter;
use chansweep_domain::notify::Notifier;
use chansweep_domain::run::{RunOptions, RunTrigger};
use chansweep_domain::store::MessageStore;
use chansweep_engine::{EngineError, Scheduler, SweepService};

/// Execute the serve command.
///
/// Arms the cron scheduler and blocks until Ctrl-C. A tick that lands
/// while the previous operation is still in flight is skipped, not
/// queued.
pub async fn execute_serve<S, N>(
    service: &SweepService<S, N>,
    formatter: &Formatter,
) -> Result<()>
where
    S: MessageStore + 'static,
    N: Notifier + 'static,
{
    let mut armed = service.config().await.settings.schedule;

    let mut scheduler = Scheduler::new();
    scheduler.reconfigure(&armed, tick(service.clone()))?;

    if !scheduler.is_active() {
        println!(
            "{}",
            formatter.warning("Schedule is disabled in configuration; nothing to do.")
        );
        return Ok(());
    }

    println!(
        "{}",
        formatter.info(&format!(
            "Scheduler running ({} in {}). Ctrl-C to stop.",
            armed.cron, armed.timezone
        ))
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            _ = tokio::time::sleep(RECONFIGURE_POLL) => {
                // Runs reload the config document; pick up schedule edits
                // it brought in without restarting the process.
                let current = service.config().await.settings.schedule;
                if current != armed {
                    tracing::info!(cron = %current.cron, "Schedule changed, rearming");
                    if let Err(e) = scheduler.reconfigure(&current, tick(service.clone())) {
                        tracing::error!(error = %e, "Invalid new schedule, scheduler stopped");
                    }
                    armed = current;
                }
            }
        }
    }

    // Let an in-flight run wind down at its next channel boundary
    service.cancel();
    scheduler.stop();
    println!("{}", formatter.info("Shutting down."));
    Ok(())
}

/// Interval at which the armed schedule is compared against the current
/// configuration.
const RECONFIGURE_POLL: std::time::Duration = std::time::Duration::from_secs(60);

fn tick<S, N>(
    service: SweepService<S, N>,
) -> impl Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> + Send + Sync
where
    S: MessageStore + 'static,
    N: Notifier + 'static,
{
    move || {
        let service = service.clone();
        Box::pin(async move {
            match service.cleanup(RunOptions::new(RunTrigger::Schedule)).await {
                Ok(run) => tracing::info!(
                    purged = run.total_purged,
                    errors = run.total_errors,
                    dry_run = run.dry_run,
                    "Scheduled cleanup finished"
                ),
                Err(EngineError::AlreadyRunning) => {
                    tracing::warn!("Previous operation still in flight, skipping this tick")
                }
                Err(e) => tracing::error!(error = %e, "Scheduled cleanup failed"),
            }
        })
    }
}
