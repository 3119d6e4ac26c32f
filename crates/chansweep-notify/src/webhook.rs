//! Embed-style webhook notifier.

use async_trait::async_trait;
use chansweep_domain::config::NotifySettings;
use chansweep_domain::notify::{Notifier, NotifyError};
use chansweep_domain::run::CleanupRun;
use chansweep_domain::sync::SyncReport;
use serde::Serialize;
use std::time::Duration;

/// Maximum characters accepted in one embed description.
pub const DESCRIPTION_LIMIT: usize = 4096;

/// Appended when a description had to be cut down to the limit.
const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Request timeout for one delivery attempt.
const DELIVERY_TIMEOUT_SECS: u64 = 10;

const COLOR_SUCCESS: u32 = 0x2ECC71;
const COLOR_WARNING: u32 = 0xE67E22;
const COLOR_ERROR: u32 = 0xE74C3C;
const COLOR_INFO: u32 = 0x3498DB;

#[derive(Serialize)]
struct WebhookPayload {
    embeds: Vec<Embed>,
}

#[derive(Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
}

/// Delivers run and discovery summaries as webhook embeds.
///
/// Routing follows [`NotifySettings`]: cleanup summaries go to the
/// cleanup target, discovery summaries to the discovery target, and an
/// unset target skips delivery for that kind.
pub struct WebhookNotifier {
    client: reqwest::Client,
    settings: NotifySettings,
}

impl WebhookNotifier {
    /// Create a notifier from configured targets.
    pub fn new(settings: NotifySettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotifyError::Delivery(format!("http client: {e}")))?;
        Ok(Self { client, settings })
    }

    async fn deliver(&self, url: &str, embed: Embed) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            embeds: vec![embed],
        };
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook returned {status}"
            )));
        }
        tracing::debug!(status = %status, "Webhook delivered");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn cleanup_complete(&self, run: &CleanupRun) -> Result<(), NotifyError> {
        let Some(url) = &self.settings.cleanup_webhook else {
            tracing::debug!("No cleanup webhook configured, skipping");
            return Ok(());
        };
        self.deliver(url.as_str(), cleanup_embed(run)).await
    }

    async fn discovery_complete(&self, report: &SyncReport) -> Result<(), NotifyError> {
        let Some(url) = &self.settings.discovery_webhook else {
            tracing::debug!("No discovery webhook configured, skipping");
            return Ok(());
        };
        self.deliver(url.as_str(), discovery_embed(report)).await
    }
}

fn cleanup_embed(run: &CleanupRun) -> Embed {
    Embed {
        title: cleanup_title(run),
        description: truncate_description(cleanup_description(run)),
        color: cleanup_color(run),
        timestamp: run.started_at.to_rfc3339(),
    }
}

fn cleanup_title(run: &CleanupRun) -> String {
    let base = if run.fatal_error.is_some() {
        "Cleanup failed"
    } else if run.cancelled {
        "Cleanup cancelled"
    } else {
        "Cleanup complete"
    };
    if run.dry_run {
        format!("{base} (dry-run)")
    } else {
        base.to_string()
    }
}

fn cleanup_color(run: &CleanupRun) -> u32 {
    if run.fatal_error.is_some() {
        COLOR_ERROR
    } else if run.total_errors > 0 || run.cancelled {
        COLOR_WARNING
    } else {
        COLOR_SUCCESS
    }
}

fn cleanup_description(run: &CleanupRun) -> String {
    if let Some(error) = &run.fatal_error {
        return format!("Run aborted before any channel was processed: {error}");
    }

    let mut lines = Vec::new();
    for category in &run.categories {
        lines.push(format!("**{}**", category.name));
        for outcome in &category.channels {
            let mut line = format!(
                "{}: {} deleted ({} bulk, {} individual)",
                outcome.channel,
                outcome.purged(),
                outcome.deleted_bulk,
                outcome.deleted_individual
            );
            if outcome.remaining > 0 {
                line.push_str(&format!(", {} remaining", outcome.remaining));
            }
            if let Some(error) = &outcome.error {
                line.push_str(&format!(" [error: {error}]"));
            }
            lines.push(line);
        }
    }

    lines.push(format!(
        "Total: {} messages across {} channels in {}ms",
        run.total_purged, run.channels_processed, run.duration_ms
    ));
    if run.total_errors > 0 {
        lines.push(format!("{} channel error(s)", run.total_errors));
    }
    lines.join("\n")
}

fn discovery_embed(report: &SyncReport) -> Embed {
    Embed {
        title: "Channel discovery".to_string(),
        description: truncate_description(report.describe()),
        color: COLOR_INFO,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Cut a description down to [`DESCRIPTION_LIMIT`] characters, marking
/// the cut. Operates on characters, never splitting a UTF-8 scalar.
fn truncate_description(text: String) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text;
    }
    let keep = DESCRIPTION_LIMIT - TRUNCATION_MARKER.chars().count();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chansweep_domain::retention::RetentionSource;
    use chansweep_domain::run::{CategorySummary, ChannelOutcome, RunId, RunTrigger};
    use chrono::Utc;

    fn run_with(categories: Vec<CategorySummary>, errors: u64) -> CleanupRun {
        CleanupRun {
            id: RunId::new(),
            started_at: Utc::now(),
            trigger: RunTrigger::Schedule,
            dry_run: false,
            categories,
            channels_processed: 1,
            total_purged: 110,
            total_errors: errors,
            duration_ms: 2500,
            cancelled: false,
            fatal_error: None,
        }
    }

    fn outcome() -> ChannelOutcome {
        ChannelOutcome {
            channel: "chat".to_string(),
            retention_days: 7,
            retention_source: RetentionSource::Global,
            deleted_bulk: 90,
            deleted_individual: 20,
            remaining: 10,
            skipped: false,
            error: None,
        }
    }

    #[test]
    fn test_cleanup_title_variants() {
        let mut run = run_with(vec![], 0);
        assert_eq!(cleanup_title(&run), "Cleanup complete");

        run.dry_run = true;
        assert_eq!(cleanup_title(&run), "Cleanup complete (dry-run)");

        run.cancelled = true;
        assert_eq!(cleanup_title(&run), "Cleanup cancelled (dry-run)");

        run.fatal_error = Some("connection refused".to_string());
        run.dry_run = false;
        assert_eq!(cleanup_title(&run), "Cleanup failed");
    }

    #[test]
    fn test_cleanup_color_reflects_outcome() {
        let mut run = run_with(vec![], 0);
        assert_eq!(cleanup_color(&run), COLOR_SUCCESS);

        run.total_errors = 2;
        assert_eq!(cleanup_color(&run), COLOR_WARNING);

        run.fatal_error = Some("gone".to_string());
        assert_eq!(cleanup_color(&run), COLOR_ERROR);
    }

    #[test]
    fn test_cleanup_description_lists_channels_and_totals() {
        let run = run_with(
            vec![CategorySummary {
                name: "general".to_string(),
                channels: vec![outcome()],
                purged: 110,
                errors: 0,
            }],
            0,
        );
        let text = cleanup_description(&run);
        assert!(text.contains("**general**"));
        assert!(text.contains("chat: 110 deleted (90 bulk, 20 individual), 10 remaining"));
        assert!(text.contains("Total: 110 messages"));
    }

    #[test]
    fn test_fatal_description_carries_error() {
        let mut run = run_with(vec![], 0);
        run.fatal_error = Some("connection refused".to_string());
        let text = cleanup_description(&run);
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_truncation_preserves_short_text() {
        let text = "short".to_string();
        assert_eq!(truncate_description(text.clone()), text);
    }

    #[test]
    fn test_truncation_caps_long_text() {
        let text = "x".repeat(DESCRIPTION_LIMIT + 500);
        let out = truncate_description(text);
        assert_eq!(out.chars().count(), DESCRIPTION_LIMIT);
        assert!(out.ends_with("... (truncated)"));
    }

    #[test]
    fn test_discovery_embed_uses_report_description() {
        let report = SyncReport {
            added_categories: vec!["voice".to_string()],
            ..SyncReport::default()
        };
        let embed = discovery_embed(&report);
        assert_eq!(embed.title, "Channel discovery");
        assert!(embed.description.contains("voice"));
        assert_eq!(embed.color, COLOR_INFO);
    }
}
