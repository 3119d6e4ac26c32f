//! Durable statistics document: JSON, load-tolerant, atomic save.

use crate::error::Result;
use crate::fsutil::write_atomic;
use chansweep_domain::stats::Stats;
use std::path::{Path, PathBuf};

/// Loads and saves the statistics document at a fixed path.
///
/// Loading never fails: a missing or unreadable document yields a fresh
/// default so an operator deleting the file resets statistics cleanly.
#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    /// Create a store bound to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or defaults when missing or corrupt.
    pub fn load(&self) -> Stats {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Stats::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read statistics, starting fresh");
                return Stats::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt statistics document, starting fresh");
                Stats::default()
            }
        }
    }

    /// Save the document atomically.
    pub fn save(&self, stats: &Stats) -> Result<()> {
        let text = serde_json::to_string_pretty(stats)?;
        write_atomic(&self.path, &text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::new(dir.path().join("stats.json"));
        let stats = store.load();
        assert!(stats.history.is_empty());
        assert_eq!(stats.lifetime.runs, 0);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::new(dir.path().join("stats.json"));
        std::fs::write(store.path(), "{ not json").unwrap();
        let stats = store.load();
        assert!(stats.last_run.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::new(dir.path().join("stats.json"));

        let mut stats = Stats::default();
        stats.lifetime.runs = 4;
        stats.lifetime.purged = 120;
        stats
            .channel_totals
            .insert("general/chat".to_string(), 120);
        store.save(&stats).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.lifetime.runs, 4);
        assert_eq!(reloaded.channel_totals["general/chat"], 120);
    }

    #[test]
    fn test_document_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::new(dir.path().join("stats.json"));
        store.save(&Stats::default()).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"channelTotals\""));
        assert!(text.contains("\"categoryTotals\""));
        assert!(text.contains("\"lifetime\""));
    }
}
