//! Configuration model: global settings plus category/channel policy.
//!
//! The configuration is process-wide mutable state owned by the engine.
//! It is replaced wholesale on reload rather than mutated field-by-field,
//! so readers never observe a half-updated structure.

use crate::retention::{is_valid_retention, FALLBACK_RETENTION_DAYS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration: global settings and the category map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Global settings
    #[serde(flatten)]
    pub settings: GlobalSettings,

    /// Category name -> category policy
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
}

/// Global settings shared by every category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Default retention in days when neither a channel override nor a
    /// category default applies. Invariant: integer `>= -1`.
    #[serde(default = "default_retention")]
    pub default_retention_days: i64,

    /// Dry-run mode: report what would be deleted without deleting
    #[serde(default)]
    pub dry_run: bool,

    /// Scheduler settings
    #[serde(default)]
    pub schedule: ScheduleSettings,

    /// Rate-limit and safety-cap settings
    #[serde(default)]
    pub limits: LimitSettings,

    /// Outbound notification targets
    #[serde(default)]
    pub notify: NotifySettings,
}

/// Scheduler settings: cron expression and timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Whether the scheduled job is active
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cron expression (6-field, seconds first)
    #[serde(default = "default_cron")]
    pub cron: String,

    /// IANA timezone name the expression is evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Rate-limit parameters and per-run safety caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Messages fetched per page (platform page limit is 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum messages fetched per channel per run
    #[serde(default = "default_fetch_ceiling")]
    pub fetch_ceiling: usize,

    /// Maximum individual (non-bulk) deletes per channel per run
    #[serde(default = "default_max_individual")]
    pub max_individual_deletes: usize,

    /// Delay between individual deletes, in milliseconds
    #[serde(default = "default_delete_delay")]
    pub delete_delay_ms: u64,

    /// Delay between channels, in milliseconds
    #[serde(default = "default_channel_delay")]
    pub channel_delay_ms: u64,

    /// Leave pinned messages alone
    #[serde(default = "default_true")]
    pub skip_pinned: bool,
}

/// Webhook targets for run and discovery summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Target for cleanup-run summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_webhook: Option<String>,

    /// Target for discovery summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_webhook: Option<String>,
}

/// A named group of channels sharing a default retention policy.
///
/// A disabled category is never cleaned, even if channels are listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    /// Whether cleanup touches this category at all. Newly discovered
    /// categories start disabled; enabling is an explicit operator act.
    #[serde(default)]
    pub enabled: bool,

    /// Category-level retention default, overriding the global default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_retention_days: Option<i64>,

    /// Explicit channel allow-list; only listed channels are ever touched
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// One entry in a category's channel allow-list.
///
/// Either a bare channel name (inherits the category/global default) or a
/// name with an inline retention override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelEntry {
    /// Bare channel name, inheriting the category or global default
    Plain(String),

    /// Channel with an inline retention override
    Override {
        /// Channel name
        name: String,
        /// Retention override in days, invariant `>= -1`
        retention_days: i64,
    },
}

impl ChannelEntry {
    /// The channel name for this entry.
    pub fn name(&self) -> &str {
        match self {
            ChannelEntry::Plain(name) => name,
            ChannelEntry::Override { name, .. } => name,
        }
    }

    /// The inline retention override, when present.
    pub fn override_days(&self) -> Option<i64> {
        match self {
            ChannelEntry::Plain(_) => None,
            ChannelEntry::Override { retention_days, .. } => Some(*retention_days),
        }
    }
}

impl Category {
    /// Look up an inline retention override for `channel`.
    pub fn override_for(&self, channel: &str) -> Option<i64> {
        self.channels
            .iter()
            .find(|e| e.name() == channel)
            .and_then(ChannelEntry::override_days)
    }

    /// Whether `channel` appears in this category's allow-list.
    pub fn contains(&self, channel: &str) -> bool {
        self.channels.iter().any(|e| e.name() == channel)
    }

    /// Channel names in list order.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(ChannelEntry::name)
    }

    /// Sort the allow-list by channel name.
    pub fn sort_channels(&mut self) {
        self.channels.sort_by(|a, b| a.name().cmp(b.name()));
    }
}

impl SweepConfig {
    /// Coerce invalid field values to safe defaults, with warnings.
    ///
    /// Applied after every load so downstream code can rely on the
    /// documented invariants. Never fails: configuration errors are
    /// warnings, not fatal conditions.
    pub fn coerce(&mut self) {
        if !is_valid_retention(self.settings.default_retention_days) {
            tracing::warn!(
                value = self.settings.default_retention_days,
                fallback = FALLBACK_RETENTION_DAYS,
                "Invalid global default retention, coercing"
            );
            self.settings.default_retention_days = FALLBACK_RETENTION_DAYS;
        }

        let limits = &mut self.settings.limits;
        if limits.page_size == 0 || limits.page_size > default_page_size() {
            tracing::warn!(value = limits.page_size, "Invalid page size, coercing to 100");
            limits.page_size = default_page_size();
        }
        if limits.fetch_ceiling == 0 {
            tracing::warn!("Zero fetch ceiling, coercing to default");
            limits.fetch_ceiling = default_fetch_ceiling();
        }

        for (name, category) in &mut self.categories {
            let before = category.channels.len();
            dedup_by_name(&mut category.channels);
            if category.channels.len() != before {
                tracing::warn!(
                    category = name.as_str(),
                    removed = before - category.channels.len(),
                    "Duplicate channel entries removed"
                );
            }
        }
    }
}

/// Drop later entries that repeat an earlier entry's channel name.
fn dedup_by_name(entries: &mut Vec<ChannelEntry>) {
    let mut seen = std::collections::BTreeSet::new();
    entries.retain(|e| seen.insert(e.name().to_string()));
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_retention_days: default_retention(),
            dry_run: false,
            schedule: ScheduleSettings::default(),
            limits: LimitSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_cron(),
            timezone: default_timezone(),
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            fetch_ceiling: default_fetch_ceiling(),
            max_individual_deletes: default_max_individual(),
            delete_delay_ms: default_delete_delay(),
            channel_delay_ms: default_channel_delay(),
            skip_pinned: true,
        }
    }
}

fn default_retention() -> i64 {
    FALLBACK_RETENTION_DAYS
}

fn default_true() -> bool {
    true
}

fn default_cron() -> String {
    // Daily at 04:00:00
    "0 0 4 * * *".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_fetch_ceiling() -> usize {
    1000
}

fn default_max_individual() -> usize {
    50
}

fn default_delete_delay() -> u64 {
    1200
}

fn default_channel_delay() -> u64 {
    2000
}
