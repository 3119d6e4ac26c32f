//! Durable configuration document: load, coerce, migrate, save.
//!
//! The configuration is a TOML document. Unrecognized top-level keys
//! round-trip untouched through load→mutate→save, with one exception:
//! the internal discovery-completion marker is stripped from the
//! passthrough set and rewritten from engine state on every save.

use crate::error::{EngineError, Result};
use crate::fsutil::write_atomic;
use chansweep_domain::config::{ChannelEntry, SweepConfig};
use std::path::{Path, PathBuf};

/// Top-level key recording that the first discovery pass has completed.
pub const DISCOVERY_MARKER_KEY: &str = "discovery_complete";

/// Top-level keys owned by [`SweepConfig`]; everything else is preserved
/// as-is across saves.
const KNOWN_KEYS: &[&str] = &[
    "default_retention_days",
    "dry_run",
    "schedule",
    "limits",
    "notify",
    "categories",
    DISCOVERY_MARKER_KEY,
];

/// Deprecated category-level key: a `channel name -> days` map, migrated
/// in place to inline [`ChannelEntry::Override`] entries.
const DEPRECATED_OVERRIDES_KEY: &str = "overrides";

/// Result of loading the configuration document.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Parsed and coerced configuration
    pub config: SweepConfig,

    /// Unrecognized top-level keys, preserved across saves
    pub extras: toml::Table,

    /// Whether the first discovery pass has completed
    pub discovery_complete: bool,

    /// Deprecated override entries converted to inline entries during
    /// this load; reported by the next sync report or discovery
    /// notification
    pub migrated_overrides: usize,
}

/// Loads and saves the configuration document at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store bound to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or defaults when the file does not exist yet.
    ///
    /// Invalid field values are coerced to safe defaults with warnings;
    /// a parse failure is returned as an error so the caller can keep
    /// its previous in-memory configuration.
    pub fn load(&self) -> Result<LoadedConfig> {
        if !self.path.exists() {
            return Ok(LoadedConfig::default());
        }

        let text = std::fs::read_to_string(&self.path)?;
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| EngineError::Config(e.to_string()))?;

        let discovery_complete = table
            .get(DISCOVERY_MARKER_KEY)
            .and_then(toml::Value::as_bool)
            .unwrap_or(false);

        let mut extras = toml::Table::new();
        for (key, value) in &table {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                extras.insert(key.clone(), value.clone());
            }
        }

        let mut config: SweepConfig = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| EngineError::Config(e.to_string()))?;
        config.coerce();

        let migrated_overrides = migrate_deprecated_overrides(&mut config, &table);

        Ok(LoadedConfig {
            config,
            extras,
            discovery_complete,
            migrated_overrides,
        })
    }

    /// Save the document atomically.
    ///
    /// Preserved extras are merged back in; the discovery marker is
    /// written from `discovery_complete`, never copied from a stale
    /// on-disk value.
    pub fn save(
        &self,
        config: &SweepConfig,
        extras: &toml::Table,
        discovery_complete: bool,
    ) -> Result<()> {
        let mut table =
            toml::Table::try_from(config).map_err(|e| EngineError::Config(e.to_string()))?;

        for (key, value) in extras {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                table.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        table.insert(
            DISCOVERY_MARKER_KEY.to_string(),
            toml::Value::Boolean(discovery_complete),
        );

        let text =
            toml::to_string_pretty(&table).map_err(|e| EngineError::Config(e.to_string()))?;
        write_atomic(&self.path, &text)?;
        Ok(())
    }
}

/// Convert deprecated `overrides` maps into inline channel entries.
///
/// An existing inline override wins over a deprecated map entry. Returns
/// the number of entries actually converted.
fn migrate_deprecated_overrides(config: &mut SweepConfig, raw: &toml::Table) -> usize {
    let Some(categories) = raw.get("categories").and_then(toml::Value::as_table) else {
        return 0;
    };

    let mut migrated = 0;
    for (name, raw_category) in categories {
        let Some(overrides) = raw_category
            .get(DEPRECATED_OVERRIDES_KEY)
            .and_then(toml::Value::as_table)
        else {
            continue;
        };
        let Some(category) = config.categories.get_mut(name) else {
            continue;
        };

        for (channel, days) in overrides {
            let Some(days) = days.as_integer() else {
                tracing::warn!(
                    category = name.as_str(),
                    channel = channel.as_str(),
                    "Non-integer deprecated override ignored"
                );
                continue;
            };

            let position = category.channels.iter().position(|e| e.name() == channel);
            match position {
                Some(i) => match &category.channels[i] {
                    ChannelEntry::Plain(_) => {
                        category.channels[i] = ChannelEntry::Override {
                            name: channel.clone(),
                            retention_days: days,
                        };
                        migrated += 1;
                    }
                    ChannelEntry::Override { .. } => {
                        tracing::warn!(
                            category = name.as_str(),
                            channel = channel.as_str(),
                            "Inline override already present, deprecated entry ignored"
                        );
                    }
                },
                None => {
                    category.channels.push(ChannelEntry::Override {
                        name: channel.clone(),
                        retention_days: days,
                    });
                    migrated += 1;
                }
            }
        }
        category.sort_channels();
    }

    if migrated > 0 {
        tracing::info!(count = migrated, "Migrated deprecated override entries");
    }
    migrated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.toml"))
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = store_in(&dir).load().unwrap();
        assert_eq!(loaded.config.settings.default_retention_days, 7);
        assert!(loaded.extras.is_empty());
        assert!(!loaded.discovery_complete);
        assert_eq!(loaded.migrated_overrides, 0);
    }

    #[test]
    fn test_roundtrip_preserves_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"
default_retention_days = 3

[dashboard]
port = 8080
"#,
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.config.settings.default_retention_days, 3);
        assert!(loaded.extras.contains_key("dashboard"));

        store
            .save(&loaded.config, &loaded.extras, loaded.discovery_complete)
            .unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("[dashboard]"));
        assert!(text.contains("port = 8080"));

        let reloaded = store.load().unwrap();
        assert!(reloaded.extras.contains_key("dashboard"));
    }

    #[test]
    fn test_marker_is_stripped_from_extras_and_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "discovery_complete = true\n").unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.discovery_complete);
        assert!(!loaded.extras.contains_key(DISCOVERY_MARKER_KEY));

        // Save with the marker cleared: the stale on-disk value must not
        // leak back in through the extras passthrough.
        store.save(&loaded.config, &loaded.extras, false).unwrap();
        let reloaded = store.load().unwrap();
        assert!(!reloaded.discovery_complete);
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "this is not [valid toml").unwrap();
        assert!(matches!(store.load(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_invalid_values_are_coerced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"
default_retention_days = -9

[limits]
page_size = 0
"#,
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.config.settings.default_retention_days, 7);
        assert_eq!(loaded.config.settings.limits.page_size, 100);
    }

    #[test]
    fn test_deprecated_overrides_are_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"
[categories.general]
enabled = true
channels = ["chat", "memes"]

[categories.general.overrides]
chat = 3
announcements = -1
"#,
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.migrated_overrides, 2);

        let cat = &loaded.config.categories["general"];
        assert_eq!(cat.override_for("chat"), Some(3));
        assert_eq!(cat.override_for("announcements"), Some(-1));
        assert_eq!(cat.override_for("memes"), None);

        // Saving drops the deprecated key
        store
            .save(&loaded.config, &loaded.extras, loaded.discovery_complete)
            .unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(!text.contains("[categories.general.overrides]"));

        // A second load has nothing left to migrate
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.migrated_overrides, 0);
        assert_eq!(reloaded.config.categories["general"].override_for("chat"), Some(3));
    }

    #[test]
    fn test_inline_override_wins_over_deprecated_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"
[categories.general]
channels = [{ name = "chat", retention_days = 5 }]

[categories.general.overrides]
chat = 99
"#,
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.migrated_overrides, 0);
        assert_eq!(loaded.config.categories["general"].override_for("chat"), Some(5));
    }
}
