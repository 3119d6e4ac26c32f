//! Run command implementation.

use crate::cli::RunArgs;
use crate::error::Result;
use crate::output::Formatter;
use chansweep_domain::notify::Notifier;
use chansweep_domain::run::{RunOptions, RunTrigger};
use chansweep_domain::store::MessageStore;
use chansweep_engine::SweepService;

/// Execute the run command.
pub async fn execute_run<S: MessageStore, N: Notifier>(
    args: RunArgs,
    service: &SweepService<S, N>,
    formatter: &Formatter,
) -> Result<()> {
    let mut opts = RunOptions::new(RunTrigger::Manual);
    opts.dry_run = args.dry_run_override();
    opts.category = args.category;
    opts.channel = args.channel;

    let run = service.cleanup(opts).await?;
    println!("{}", formatter.format_run(&run)?);
    Ok(())
}
