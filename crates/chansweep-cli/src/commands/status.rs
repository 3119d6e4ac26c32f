//! Status command implementation.

use crate::error::Result;
use crate::output::Formatter;
use chansweep_domain::notify::Notifier;
use chansweep_domain::store::MessageStore;
use chansweep_engine::SweepService;

/// Execute the status command.
pub async fn execute_status<S: MessageStore, N: Notifier>(
    service: &SweepService<S, N>,
    formatter: &Formatter,
) -> Result<()> {
    let status = service.status();
    println!("{}", formatter.format_status(&status)?);
    Ok(())
}
