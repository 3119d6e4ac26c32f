//! Rolling run statistics: bounded history, lifetime counters, and
//! pruned per-entity leaderboards.

use crate::run::{CleanupRun, RunSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum run summaries kept in history.
pub const HISTORY_CAP: usize = 90;

/// Maximum entries in the per-channel leaderboard.
pub const CHANNEL_TOTALS_CAP: usize = 200;

/// Maximum entries in the per-category leaderboard.
pub const CATEGORY_TOTALS_CAP: usize = 100;

/// Lifetime counters across all live runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeTotals {
    /// Live runs recorded
    pub runs: u64,

    /// Messages purged across all live runs
    pub purged: u64,

    /// Isolated errors across all live runs
    pub errors: u64,

    /// When the first live run was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_run_at: Option<DateTime<Utc>>,
}

/// Persisted statistics document.
///
/// History is most-recent-first and capped at [`HISTORY_CAP`]. Lifetime
/// counters and the leaderboard maps are updated by live (non-dry-run)
/// runs only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Most recent run of any kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<RunSummary>,

    /// Most recent live run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_live_run: Option<RunSummary>,

    /// Run history, most recent first
    #[serde(default)]
    pub history: Vec<RunSummary>,

    /// Lifetime counters (live runs only)
    #[serde(default)]
    pub lifetime: LifetimeTotals,

    /// Cumulative purge count per channel, pruned to the top
    /// [`CHANNEL_TOTALS_CAP`] entries
    #[serde(default)]
    pub channel_totals: BTreeMap<String, u64>,

    /// Cumulative purge count per category, pruned to the top
    /// [`CATEGORY_TOTALS_CAP`] entries
    #[serde(default)]
    pub category_totals: BTreeMap<String, u64>,
}

impl Stats {
    /// Record a completed run.
    ///
    /// Appends the summary to history (most recent first, truncated at
    /// the cap) and, for live runs only, updates the lifetime counters
    /// and leaderboards.
    pub fn record(&mut self, run: &CleanupRun) {
        let summary = run.summary();

        self.history.insert(0, summary.clone());
        self.history.truncate(HISTORY_CAP);
        self.last_run = Some(summary.clone());

        if run.dry_run {
            return;
        }

        self.last_live_run = Some(summary);
        self.lifetime.runs += 1;
        self.lifetime.purged += run.total_purged;
        self.lifetime.errors += run.total_errors;
        if self.lifetime.first_run_at.is_none() {
            self.lifetime.first_run_at = Some(run.started_at);
        }

        for category in &run.categories {
            if category.purged > 0 {
                *self.category_totals.entry(category.name.clone()).or_insert(0) +=
                    category.purged;
            }
            for channel in &category.channels {
                let purged = channel.purged();
                if purged > 0 {
                    *self.channel_totals.entry(channel.channel.clone()).or_insert(0) += purged;
                }
            }
        }

        prune_top(&mut self.channel_totals, CHANNEL_TOTALS_CAP);
        prune_top(&mut self.category_totals, CATEGORY_TOTALS_CAP);
    }
}

/// Keep the `cap` highest-count entries.
///
/// Greedy truncation rather than a streaming top-N structure; acceptable
/// because pruning only runs when a map exceeds its cap.
fn prune_top(map: &mut BTreeMap<String, u64>, cap: usize) {
    if map.len() <= cap {
        return;
    }
    let mut entries: Vec<(String, u64)> = std::mem::take(map).into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(cap);
    map.extend(entries);
}
