//! Change report produced by the discovery reconciler.

use serde::{Deserialize, Serialize};

/// A (category, channel) pair referenced in a change report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Category the channel belongs to
    pub category: String,

    /// Channel name
    pub channel: String,
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.channel)
    }
}

/// Structured change report from an incremental discovery or a full sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Categories added to configuration (disabled, full channel list)
    pub added_categories: Vec<String>,

    /// Categories removed from configuration (full sync only)
    pub removed_categories: Vec<String>,

    /// Channels appended to existing categories
    pub added_channels: Vec<ChannelRef>,

    /// Channels removed from allow-lists (full sync only)
    pub removed_channels: Vec<ChannelRef>,

    /// Overrides dropped because their channel no longer exists
    pub dropped_overrides: Vec<ChannelRef>,

    /// Deprecated overrides-map entries migrated to inline entries
    pub migrated_overrides: usize,
}

impl SyncReport {
    /// Whether the reconciliation changed anything.
    pub fn is_empty(&self) -> bool {
        self.added_categories.is_empty()
            && self.removed_categories.is_empty()
            && self.added_channels.is_empty()
            && self.removed_channels.is_empty()
            && self.dropped_overrides.is_empty()
            && self.migrated_overrides == 0
    }

    /// Total individual changes, for log lines and summaries.
    pub fn change_count(&self) -> usize {
        self.added_categories.len()
            + self.removed_categories.len()
            + self.added_channels.len()
            + self.removed_channels.len()
            + self.dropped_overrides.len()
            + self.migrated_overrides
    }

    /// Human-readable multi-line summary.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "No changes.".to_string();
        }
        let mut lines = Vec::new();
        if !self.added_categories.is_empty() {
            lines.push(format!("Added categories: {}", self.added_categories.join(", ")));
        }
        if !self.removed_categories.is_empty() {
            lines.push(format!(
                "Removed categories: {}",
                self.removed_categories.join(", ")
            ));
        }
        if !self.added_channels.is_empty() {
            lines.push(format!("Added channels: {}", join_refs(&self.added_channels)));
        }
        if !self.removed_channels.is_empty() {
            lines.push(format!("Removed channels: {}", join_refs(&self.removed_channels)));
        }
        if !self.dropped_overrides.is_empty() {
            lines.push(format!(
                "Dropped overrides: {}",
                join_refs(&self.dropped_overrides)
            ));
        }
        if self.migrated_overrides > 0 {
            lines.push(format!(
                "Migrated {} deprecated override entries",
                self.migrated_overrides
            ));
        }
        lines.join("\n")
    }
}

fn join_refs(refs: &[ChannelRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
