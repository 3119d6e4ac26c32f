//! Sync command implementation.

use crate::error::Result;
use crate::output::Formatter;
use chansweep_domain::notify::Notifier;
use chansweep_domain::store::MessageStore;
use chansweep_engine::SweepService;

/// Execute the sync command: full additive-and-subtractive reconciliation.
pub async fn execute_sync<S: MessageStore, N: Notifier>(
    service: &SweepService<S, N>,
    formatter: &Formatter,
) -> Result<()> {
    let report = service.sync().await?;
    println!("{}", formatter.format_sync(&report)?);
    Ok(())
}
