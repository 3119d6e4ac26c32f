//! Discovery reconciler: compares the platform's category/channel set
//! against configuration.
//!
//! Two modes, both idempotent over a fixed [`Listing`]:
//! - incremental: additive only, runs automatically before every cleanup
//! - full sync: additive and subtractive, manual trigger only
//!
//! Reconciliation itself is pure over `(&mut SweepConfig, &Listing)`;
//! fetching the listing is the only I/O.

use chansweep_domain::config::{Category, ChannelEntry, SweepConfig};
use chansweep_domain::store::{MessageStore, StoreError};
use chansweep_domain::sync::{ChannelRef, SyncReport};
use std::collections::BTreeMap;

/// Snapshot of the platform's current category/channel set.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Category name -> channel names
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Listing {
    /// Fetch the current listing from a store.
    pub async fn fetch<S: MessageStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let mut categories = BTreeMap::new();
        for category in store.list_categories().await? {
            let channels = store.list_channels(&category).await?;
            categories.insert(category, channels);
        }
        Ok(Self { categories })
    }

    /// Whether `channel` currently exists under `category`.
    fn has_channel(&self, category: &str, channel: &str) -> bool {
        self.categories
            .get(category)
            .is_some_and(|chans| chans.iter().any(|c| c == channel))
    }
}

/// Incremental reconciliation: additive only.
///
/// New categories appear disabled with their full current channel list;
/// new channels are appended to existing categories (then the list is
/// re-sorted). Nothing is ever removed.
pub fn reconcile_incremental(config: &mut SweepConfig, listing: &Listing) -> SyncReport {
    let mut report = SyncReport::default();

    for (name, channels) in &listing.categories {
        match config.categories.get_mut(name) {
            None => {
                let mut entries: Vec<ChannelEntry> = channels
                    .iter()
                    .map(|c| ChannelEntry::Plain(c.clone()))
                    .collect();
                entries.sort_by(|a, b| a.name().cmp(b.name()));

                config.categories.insert(
                    name.clone(),
                    Category {
                        enabled: false,
                        default_retention_days: None,
                        channels: entries,
                    },
                );
                tracing::info!(category = name.as_str(), "Discovered new category (disabled)");
                report.added_categories.push(name.clone());
            }
            Some(category) => {
                let mut added = false;
                for channel in channels {
                    if !category.contains(channel) {
                        category.channels.push(ChannelEntry::Plain(channel.clone()));
                        report.added_channels.push(ChannelRef {
                            category: name.clone(),
                            channel: channel.clone(),
                        });
                        added = true;
                    }
                }
                if added {
                    category.sort_channels();
                }
            }
        }
    }

    report
}

/// Full sync: additive and subtractive.
///
/// On top of the incremental additions, categories and channels absent
/// from the platform are removed. Overrides for surviving channels are
/// preserved; overrides for removed channels are dropped with a warning.
pub fn reconcile_full(config: &mut SweepConfig, listing: &Listing) -> SyncReport {
    let mut report = reconcile_incremental(config, listing);

    let stale: Vec<String> = config
        .categories
        .keys()
        .filter(|name| !listing.categories.contains_key(*name))
        .cloned()
        .collect();
    for name in stale {
        config.categories.remove(&name);
        tracing::info!(category = name.as_str(), "Category no longer exists, removed");
        report.removed_categories.push(name);
    }

    for (name, category) in &mut config.categories {
        category.channels.retain(|entry| {
            if listing.has_channel(name, entry.name()) {
                return true;
            }
            let reference = ChannelRef {
                category: name.clone(),
                channel: entry.name().to_string(),
            };
            if entry.override_days().is_some() {
                tracing::warn!(
                    category = name.as_str(),
                    channel = entry.name(),
                    "Dropping retention override for removed channel"
                );
                report.dropped_overrides.push(reference.clone());
            }
            report.removed_channels.push(reference);
            false
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(entries: &[(&str, &[&str])]) -> Listing {
        Listing {
            categories: entries
                .iter()
                .map(|(cat, chans)| {
                    (
                        cat.to_string(),
                        chans.iter().map(|c| c.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    fn config_with(entries: &[(&str, bool, &[ChannelEntry])]) -> SweepConfig {
        let mut config = SweepConfig::default();
        for (name, enabled, channels) in entries {
            config.categories.insert(
                name.to_string(),
                Category {
                    enabled: *enabled,
                    default_retention_days: None,
                    channels: channels.to_vec(),
                },
            );
        }
        config
    }

    fn plain(name: &str) -> ChannelEntry {
        ChannelEntry::Plain(name.to_string())
    }

    fn with_override(name: &str, days: i64) -> ChannelEntry {
        ChannelEntry::Override {
            name: name.to_string(),
            retention_days: days,
        }
    }

    #[test]
    fn test_incremental_adds_new_category_disabled() {
        let mut config = SweepConfig::default();
        let report =
            reconcile_incremental(&mut config, &listing(&[("general", &["chat", "memes"])]));

        assert_eq!(report.added_categories, vec!["general"]);
        let cat = &config.categories["general"];
        assert!(!cat.enabled);
        let names: Vec<&str> = cat.channel_names().collect();
        assert_eq!(names, vec!["chat", "memes"]);
    }

    #[test]
    fn test_incremental_appends_new_channels_sorted() {
        let mut config = config_with(&[("general", true, &[plain("chat")])]);
        let report = reconcile_incremental(
            &mut config,
            &listing(&[("general", &["chat", "announcements"])]),
        );

        assert_eq!(report.added_channels.len(), 1);
        assert_eq!(report.added_channels[0].channel, "announcements");
        let names: Vec<&str> = config.categories["general"].channel_names().collect();
        assert_eq!(names, vec!["announcements", "chat"]);
    }

    #[test]
    fn test_incremental_never_removes() {
        let mut config = config_with(&[
        ("general", true, &[plain("chat"), plain("gone")]),
            ("stale", true, &[plain("old")]),
        ]);
        let report = reconcile_incremental(&mut config, &listing(&[("general", &["chat"])]));

        assert!(report.is_empty());
        assert!(config.categories.contains_key("stale"));
        assert!(config.categories["general"].contains("gone"));
    }

    #[test]
    fn test_incremental_is_idempotent() {
        let mut config = SweepConfig::default();
        let snapshot = listing(&[("general", &["chat"])]);
        let first = reconcile_incremental(&mut config, &snapshot);
        let second = reconcile_incremental(&mut config, &snapshot);
        assert!(!first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn test_full_sync_removes_stale_category() {
        // Scenario: a previously-known category no longer exists
        let mut config = config_with(&[
            ("general", true, &[plain("chat")]),
            ("stale", true, &[plain("old")]),
        ]);
        let report = reconcile_full(&mut config, &listing(&[("general", &["chat"])]));

        assert_eq!(report.removed_categories, vec!["stale"]);
        assert_eq!(report.change_count(), 1);
        assert!(!config.categories.contains_key("stale"));
    }

    #[test]
    fn test_full_sync_preserves_surviving_overrides() {
        let mut config = config_with(&[(
            "general",
            true,
            &[with_override("archive", -1), plain("gone")],
        )]);
        let report =
            reconcile_full(&mut config, &listing(&[("general", &["archive", "chat"])]));

        let cat = &config.categories["general"];
        assert_eq!(cat.override_for("archive"), Some(-1));
        assert!(cat.contains("chat"));
        assert!(!cat.contains("gone"));
        assert_eq!(report.removed_channels.len(), 1);
        assert!(report.dropped_overrides.is_empty());
    }

    #[test]
    fn test_full_sync_drops_override_for_removed_channel() {
        let mut config = config_with(&[("general", true, &[with_override("gone", 3)])]);
        let report = reconcile_full(&mut config, &listing(&[("general", &[])]));

        assert_eq!(report.dropped_overrides.len(), 1);
        assert_eq!(report.dropped_overrides[0].channel, "gone");
        assert!(config.categories["general"].channels.is_empty());
    }

    #[test]
    fn test_full_sync_is_idempotent() {
        let mut config = config_with(&[
            ("general", true, &[plain("chat"), plain("gone")]),
            ("stale", false, &[]),
        ]);
        let snapshot = listing(&[("general", &["chat", "memes"])]);

        let first = reconcile_full(&mut config, &snapshot);
        assert!(!first.is_empty());

        let second = reconcile_full(&mut config, &snapshot);
        assert!(second.is_empty());
    }
}
