//! Run records: the immutable outcome of one cleanup execution.

use crate::retention::RetentionSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a cleanup run (UUIDv7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a new run identifier.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What initiated a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    /// The scheduler fired
    Schedule,

    /// An operator triggered it directly (CLI)
    Manual,

    /// An external API caller triggered it
    Api,
}

impl RunTrigger {
    /// Get the trigger name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Schedule => "schedule",
            RunTrigger::Manual => "manual",
            RunTrigger::Api => "api",
        }
    }
}

/// Options selecting the scope and mode of a cleanup run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// What initiated the run
    pub trigger: RunTrigger,

    /// `Some(true)` forces dry-run, `Some(false)` forces live,
    /// `None` follows the configuration
    pub dry_run: Option<bool>,

    /// Restrict the run to one category
    pub category: Option<String>,

    /// Restrict the run to one channel
    pub channel: Option<String>,
}

impl RunOptions {
    /// Options for an unrestricted run following the configured mode.
    pub fn new(trigger: RunTrigger) -> Self {
        Self {
            trigger,
            dry_run: None,
            category: None,
            channel: None,
        }
    }
}

/// Per-channel outcome within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOutcome {
    /// Channel name
    pub channel: String,

    /// Effective retention applied
    pub retention_days: i64,

    /// Which tier supplied the retention value
    pub retention_source: RetentionSource,

    /// Messages deleted through batch calls
    pub deleted_bulk: u64,

    /// Messages deleted one at a time
    pub deleted_individual: u64,

    /// Individually-eligible messages left for the next run by the cap
    pub remaining: u64,

    /// Channel was skipped (retention -1)
    pub skipped: bool,

    /// Isolated per-channel failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelOutcome {
    /// Total messages purged (or would-purge, in dry-run) for this channel.
    pub fn purged(&self) -> u64 {
        self.deleted_bulk + self.deleted_individual
    }
}

/// Per-category breakdown within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category name
    pub name: String,

    /// Channel outcomes, in processing order
    pub channels: Vec<ChannelOutcome>,

    /// Messages purged across the category
    pub purged: u64,

    /// Isolated channel errors across the category
    pub errors: u64,
}

impl CategorySummary {
    /// A category with no purges, no leftovers, and no errors is
    /// suppressed from run summaries.
    pub fn is_quiet(&self) -> bool {
        self.purged == 0 && self.errors == 0 && self.channels.iter().all(|c| c.remaining == 0)
    }
}

/// Immutable record of one cleanup execution.
///
/// Created once at run completion, appended to history, never mutated
/// afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupRun {
    /// Run identifier
    pub id: RunId,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// What initiated the run
    pub trigger: RunTrigger,

    /// Whether the run was a dry-run
    pub dry_run: bool,

    /// Per-category breakdown (quiet categories suppressed)
    pub categories: Vec<CategorySummary>,

    /// Channels processed (including skipped ones)
    pub channels_processed: u64,

    /// Total messages purged
    pub total_purged: u64,

    /// Total isolated errors
    pub total_errors: u64,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// Cancellation was observed before completion
    pub cancelled: bool,

    /// Run-level fatal error (platform unreachable); implies zero progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl CleanupRun {
    /// Compact projection for history listings.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            id: self.id,
            started_at: self.started_at,
            trigger: self.trigger,
            dry_run: self.dry_run,
            purged: self.total_purged,
            errors: self.total_errors,
            duration_ms: self.duration_ms,
            cancelled: self.cancelled,
            fatal: self.fatal_error.is_some(),
        }
    }
}

/// Compact run record kept in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Run identifier
    pub id: RunId,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// What initiated the run
    pub trigger: RunTrigger,

    /// Whether the run was a dry-run
    pub dry_run: bool,

    /// Total messages purged
    pub purged: u64,

    /// Total isolated errors
    pub errors: u64,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// Cancellation was observed
    pub cancelled: bool,

    /// The run failed fatally before making progress
    pub fatal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(channel: &str, bulk: u64, individual: u64, remaining: u64) -> ChannelOutcome {
        ChannelOutcome {
            channel: channel.to_string(),
            retention_days: 7,
            retention_source: RetentionSource::Global,
            deleted_bulk: bulk,
            deleted_individual: individual,
            remaining,
            skipped: false,
            error: None,
        }
    }

    #[test]
    fn test_run_ids_are_time_ordered() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_channel_outcome_purged() {
        let o = outcome("general", 90, 20, 10);
        assert_eq!(o.purged(), 110);
    }

    #[test]
    fn test_quiet_category_detection() {
        let quiet = CategorySummary {
            name: "general".to_string(),
            channels: vec![outcome("general", 0, 0, 0)],
            purged: 0,
            errors: 0,
        };
        assert!(quiet.is_quiet());

        let leftovers = CategorySummary {
            name: "general".to_string(),
            channels: vec![outcome("general", 0, 0, 5)],
            purged: 0,
            errors: 0,
        };
        assert!(!leftovers.is_quiet());

        let erred = CategorySummary {
            name: "general".to_string(),
            channels: vec![],
            purged: 0,
            errors: 1,
        };
        assert!(!erred.is_quiet());
    }

    #[test]
    fn test_summary_projection() {
        let run = CleanupRun {
            id: RunId::new(),
            started_at: Utc::now(),
            trigger: RunTrigger::Manual,
            dry_run: true,
            categories: vec![],
            channels_processed: 3,
            total_purged: 110,
            total_errors: 1,
            duration_ms: 1234,
            cancelled: false,
            fatal_error: None,
        };
        let summary = run.summary();
        assert_eq!(summary.purged, 110);
        assert_eq!(summary.errors, 1);
        assert!(summary.dry_run);
        assert!(!summary.fatal);
    }
}
