//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chansweep - per-channel message retention cleanup.
#[derive(Debug, Parser)]
#[command(name = "chansweep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CHANSWEEP_CONFIG", default_value = "chansweep.toml")]
    pub config: PathBuf,

    /// Statistics file path
    #[arg(long, global = true, env = "CHANSWEEP_STATS", default_value = "chansweep-stats.json")]
    pub stats: PathBuf,

    /// Channel snapshot file path
    #[arg(long, global = true, env = "CHANSWEEP_SNAPSHOT", default_value = "snapshot.json")]
    pub snapshot: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a cleanup pass now
    Run(RunArgs),

    /// Full channel sync: add new, remove stale
    Sync,

    /// Show service status and lifetime totals
    Status,

    /// List recent runs
    History(HistoryArgs),

    /// Run the cron scheduler in the foreground
    Serve,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Report what would be deleted without deleting
    #[arg(long, conflicts_with = "live")]
    pub dry_run: bool,

    /// Force a live run even if the configuration says dry-run
    #[arg(long)]
    pub live: bool,

    /// Restrict the run to one category
    #[arg(long)]
    pub category: Option<String>,

    /// Restrict the run to one channel
    #[arg(long)]
    pub channel: Option<String>,
}

impl RunArgs {
    /// The dry-run override this invocation expresses, if any.
    pub fn dry_run_override(&self) -> Option<bool> {
        if self.dry_run {
            Some(true)
        } else if self.live {
            Some(false)
        } else {
            None
        }
    }
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Maximum number of runs to list
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}
