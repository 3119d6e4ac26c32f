//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use chansweep_domain::run::{CleanupRun, RunSummary};
use chansweep_domain::sync::SyncReport;
use chansweep_engine::StatusReport;
use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a completed cleanup run.
    pub fn format_run(&self, run: &CleanupRun) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(run)?),
            CliFormat::Table => Ok(self.format_run_table(run)),
        }
    }

    fn format_run_table(&self, run: &CleanupRun) -> String {
        let mut out = String::new();

        if let Some(error) = &run.fatal_error {
            out.push_str(&self.error(&format!("Run failed before any progress: {error}")));
            return out;
        }

        if run.channels_processed == 0 {
            out.push_str(&self.warning("No enabled channels to process."));
        } else if run.categories.is_empty() {
            out.push_str(&self.success("All channels already clean."));
        } else {
            let mut builder = Builder::default();
            builder.push_record([
                "Category",
                "Channel",
                "Retention",
                "Bulk",
                "Individual",
                "Remaining",
                "Note",
            ]);
            for category in &run.categories {
                for outcome in &category.channels {
                    let note = if let Some(error) = &outcome.error {
                        format!("error: {error}")
                    } else if outcome.skipped {
                        "skipped".to_string()
                    } else {
                        String::new()
                    };
                    builder.push_record([
                        category.name.as_str(),
                        outcome.channel.as_str(),
                        &retention_label(outcome.retention_days),
                        &outcome.deleted_bulk.to_string(),
                        &outcome.deleted_individual.to_string(),
                        &outcome.remaining.to_string(),
                        &note,
                    ]);
                }
            }
            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            out.push_str(&table.to_string());
            out.push('\n');
        }

        let mode = if run.dry_run { "would delete" } else { "deleted" };
        let mut summary = format!(
            "{} {} message(s) across {} channel(s) in {}ms",
            mode, run.total_purged, run.channels_processed, run.duration_ms
        );
        if run.cancelled {
            summary.push_str(" (cancelled)");
        }
        out.push('\n');
        if run.total_errors > 0 {
            out.push_str(&self.warning(&format!("{summary}, {} error(s)", run.total_errors)));
        } else {
            out.push_str(&self.success(&summary));
        }
        out
    }

    /// Format a sync report.
    pub fn format_sync(&self, report: &SyncReport) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            CliFormat::Table => {
                if report.is_empty() {
                    Ok(self.info("Configuration already matches the platform."))
                } else {
                    Ok(format!(
                        "{}\n{}",
                        report.describe(),
                        self.success(&format!("{} change(s) applied", report.change_count()))
                    ))
                }
            }
        }
    }

    /// Format a status report.
    pub fn format_status(&self, status: &StatusReport) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(status)?),
            CliFormat::Table => {
                let mut lines = Vec::new();
                lines.push(format!(
                    "Running:       {}",
                    if status.running { "yes" } else { "no" }
                ));
                lines.push(format!("Last run:      {}", summary_line(&status.last_run)));
                lines.push(format!(
                    "Last live run: {}",
                    summary_line(&status.last_live_run)
                ));
                lines.push(format!(
                    "Lifetime:      {} run(s), {} purged, {} error(s)",
                    status.lifetime.runs, status.lifetime.purged, status.lifetime.errors
                ));
                if let Some(first) = status.lifetime.first_run_at {
                    lines.push(format!(
                        "Since:         {}",
                        first.format("%Y-%m-%d %H:%M:%S UTC")
                    ));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format run history.
    pub fn format_history(&self, history: &[RunSummary]) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(history)?),
            CliFormat::Table => {
                if history.is_empty() {
                    return Ok(self.info("No runs recorded yet."));
                }
                let mut builder = Builder::default();
                builder.push_record(["Started", "Trigger", "Mode", "Purged", "Errors", "Duration", "Note"]);
                for run in history {
                    builder.push_record([
                        &run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                        run.trigger.as_str(),
                        &(if run.dry_run { "dry-run" } else { "live" }).to_string(),
                        &run.purged.to_string(),
                        &run.errors.to_string(),
                        &format!("{}ms", run.duration_ms),
                        summary_note(run),
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(message, "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(message, "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(message, "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(message, "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }
        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn retention_label(days: i64) -> String {
    match days {
        -1 => "never".to_string(),
        0 => "0d (all)".to_string(),
        d => format!("{d}d"),
    }
}

fn summary_line(summary: &Option<RunSummary>) -> String {
    match summary {
        None => "never".to_string(),
        Some(run) => format!(
            "{} ({}, {} purged{})",
            run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.trigger.as_str(),
            run.purged,
            if run.dry_run { ", dry-run" } else { "" }
        ),
    }
}

fn summary_note(run: &RunSummary) -> &'static str {
    if run.fatal {
        "fatal"
    } else if run.cancelled {
        "cancelled"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chansweep_domain::retention::RetentionSource;
    use chansweep_domain::run::{CategorySummary, ChannelOutcome, RunId, RunTrigger};
    use chrono::Utc;

    fn sample_run() -> CleanupRun {
        CleanupRun {
            id: RunId::new(),
            started_at: Utc::now(),
            trigger: RunTrigger::Manual,
            dry_run: false,
            categories: vec![CategorySummary {
                name: "general".to_string(),
                channels: vec![ChannelOutcome {
                    channel: "chat".to_string(),
                    retention_days: 7,
                    retention_source: RetentionSource::Global,
                    deleted_bulk: 90,
                    deleted_individual: 20,
                    remaining: 10,
                    skipped: false,
                    error: None,
                }],
                purged: 110,
                errors: 0,
            }],
            channels_processed: 1,
            total_purged: 110,
            total_errors: 0,
            duration_ms: 2100,
            cancelled: false,
            fatal_error: None,
        }
    }

    #[test]
    fn test_run_table_output() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_run(&sample_run()).unwrap();
        assert!(output.contains("chat"));
        assert!(output.contains("90"));
        assert!(output.contains("deleted 110 message(s)"));
    }

    #[test]
    fn test_run_json_output() {
        let formatter = Formatter::new(CliFormat::Json, false);
        let output = formatter.format_run(&sample_run()).unwrap();
        assert!(output.contains("\"total_purged\": 110"));
    }

    #[test]
    fn test_dry_run_wording() {
        let mut run = sample_run();
        run.dry_run = true;
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_run(&run).unwrap();
        assert!(output.contains("would delete 110 message(s)"));
    }

    #[test]
    fn test_fatal_run_output() {
        let mut run = sample_run();
        run.fatal_error = Some("connection refused".to_string());
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_run(&run).unwrap();
        assert!(output.contains("connection refused"));
    }

    #[test]
    fn test_retention_labels() {
        assert_eq!(retention_label(-1), "never");
        assert_eq!(retention_label(0), "0d (all)");
        assert_eq!(retention_label(14), "14d");
    }

    #[test]
    fn test_empty_history() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_history(&[]).unwrap();
        assert!(output.contains("No runs recorded"));
    }

    #[test]
    fn test_history_table() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_history(&[sample_run().summary()]).unwrap();
        assert!(output.contains("manual"));
        assert!(output.contains("live"));
    }

    #[test]
    fn test_colorize_disabled_passthrough() {
        let formatter = Formatter::new(CliFormat::Table, false);
        assert_eq!(formatter.success("done"), "done");
    }
}
