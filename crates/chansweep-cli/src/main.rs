//! chansweep - per-channel message retention cleanup.

use chansweep_cli::{commands, Cli, Command, Formatter, SnapshotStore};
use chansweep_engine::{ConfigStore, Engine, SweepService};
use chansweep_notify::WebhookNotifier;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> chansweep_cli::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let formatter = Formatter::new(cli.format, !cli.no_color);

    // Status and history only read local documents; everything else
    // needs the channel snapshot.
    let store = match &cli.command {
        Command::Status | Command::History(_) => SnapshotStore::empty(),
        _ => SnapshotStore::load(&cli.snapshot)?,
    };

    // Webhook targets come from the same configuration document the
    // engine owns; read them once up front to build the notifier.
    let notify_settings = ConfigStore::new(cli.config.clone())
        .load()
        .map(|loaded| loaded.config.settings.notify)
        .unwrap_or_default();
    let notifier = WebhookNotifier::new(notify_settings)?;

    let engine = Engine::new(store, notifier, cli.config.clone(), cli.stats.clone())?;
    let service = SweepService::new(engine);

    match cli.command {
        Command::Run(args) => commands::execute_run(args, &service, &formatter).await?,
        Command::Sync => commands::execute_sync(&service, &formatter).await?,
        Command::Status => commands::execute_status(&service, &formatter).await?,
        Command::History(args) => commands::execute_history(args, &service, &formatter).await?,
        Command::Serve => commands::execute_serve(&service, &formatter).await?,
    }

    Ok(())
}
