//! History command implementation.

use crate::cli::HistoryArgs;
use crate::error::Result;
use crate::output::Formatter;
use chansweep_domain::notify::Notifier;
use chansweep_domain::store::MessageStore;
use chansweep_engine::SweepService;

/// Execute the history command.
pub async fn execute_history<S: MessageStore, N: Notifier>(
    args: HistoryArgs,
    service: &SweepService<S, N>,
    formatter: &Formatter,
) -> Result<()> {
    let history = service.history(args.limit);
    println!("{}", formatter.format_history(&history)?);
    Ok(())
}
