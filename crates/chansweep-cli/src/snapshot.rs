//! File-backed message store.
//!
//! Reads a JSON snapshot of categories, channels, and messages, and
//! serves it through the engine's store interface with in-memory
//! deletes. This is the stand-in transport for the CLI: the same engine
//! runs unchanged against any other [`MessageStore`] implementation.

use crate::error::{CliError, Result};
use async_trait::async_trait;
use chansweep_domain::store::{Message, MessageStore, StoreError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// On-disk snapshot shape: category -> channel -> messages.
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    categories: BTreeMap<String, BTreeMap<String, Vec<Message>>>,
}

/// Message store over a loaded snapshot.
///
/// Channel names are assumed unique across categories, matching the
/// platform's guild-wide uniqueness.
pub struct SnapshotStore {
    categories: BTreeMap<String, Vec<String>>,
    messages: Mutex<BTreeMap<String, Vec<Message>>>,
}

impl SnapshotStore {
    /// Store with no categories at all, for commands that never touch
    /// the platform.
    pub fn empty() -> Self {
        Self {
            categories: BTreeMap::new(),
            messages: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load a snapshot from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::InvalidInput(format!("cannot read snapshot {}: {e}", path.display()))
        })?;
        let file: SnapshotFile = serde_json::from_str(&text)?;

        let mut categories = BTreeMap::new();
        let mut messages = BTreeMap::new();
        for (category, channels) in file.categories {
            let mut names: Vec<String> = channels.keys().cloned().collect();
            names.sort();
            categories.insert(category, names);

            for (channel, mut list) in channels {
                // Served newest-first, the way the platform pages
                list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                messages.insert(channel, list);
            }
        }

        tracing::debug!(
            categories = categories.len(),
            channels = messages.len(),
            "Snapshot loaded"
        );
        Ok(Self {
            categories,
            messages: Mutex::new(messages),
        })
    }

    /// Total messages currently held across all channels.
    pub fn message_count(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }
}

#[async_trait]
impl MessageStore for SnapshotStore {
    async fn list_categories(&self) -> std::result::Result<Vec<String>, StoreError> {
        Ok(self.categories.keys().cloned().collect())
    }

    async fn list_channels(&self, category: &str) -> std::result::Result<Vec<String>, StoreError> {
        Ok(self.categories.get(category).cloned().unwrap_or_default())
    }

    async fn fetch_messages_before(
        &self,
        channel: &str,
        before: Option<&str>,
        limit: usize,
    ) -> std::result::Result<Vec<Message>, StoreError> {
        let messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        let Some(list) = messages.get(channel) else {
            return Err(StoreError::Channel {
                channel: channel.to_string(),
                reason: "not present in snapshot".to_string(),
            });
        };

        let start = match before {
            None => 0,
            Some(id) => match list.iter().position(|m| m.id == id) {
                Some(i) => i + 1,
                None => return Ok(vec![]),
            },
        };
        Ok(list.iter().skip(start).take(limit).cloned().collect())
    }

    async fn delete_message(&self, channel: &str, id: &str) -> std::result::Result<(), StoreError> {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = messages.get_mut(channel) {
            list.retain(|m| m.id != id);
        }
        Ok(())
    }

    async fn delete_batch(
        &self,
        channel: &str,
        ids: &[String],
    ) -> std::result::Result<(), StoreError> {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = messages.get_mut(channel) {
            list.retain(|m| !ids.contains(&m.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "categories": {
            "general": {
                "chat": [
                    {"id": "a", "created_at": "2026-08-01T00:00:00Z"},
                    {"id": "b", "created_at": "2026-08-20T00:00:00Z", "pinned": true},
                    {"id": "c", "created_at": "2026-08-10T00:00:00Z"}
                ],
                "memes": []
            }
        }
    }"#;

    fn store() -> SnapshotStore {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, SNAPSHOT).unwrap();
        SnapshotStore::load(&path).unwrap()
    }

    #[tokio::test]
    async fn test_listing() {
        let store = store();
        assert_eq!(store.list_categories().await.unwrap(), vec!["general"]);
        assert_eq!(
            store.list_channels("general").await.unwrap(),
            vec!["chat", "memes"]
        );
        assert_eq!(store.message_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_is_newest_first_and_paged() {
        let store = store();
        let first = store
            .fetch_messages_before("chat", None, 2)
            .await
            .unwrap();
        let ids: Vec<&str> = first.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let rest = store
            .fetch_messages_before("chat", Some("c"), 2)
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, "a");
    }

    #[tokio::test]
    async fn test_unknown_channel_is_channel_error() {
        let store = store();
        let err = store
            .fetch_messages_before("nope", None, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Channel { .. }));
    }

    #[tokio::test]
    async fn test_deletes_shrink_the_snapshot() {
        let store = store();
        store
            .delete_batch("chat", &["a".to_string(), "c".to_string()])
            .await
            .unwrap();
        store.delete_message("chat", "b").await.unwrap();
        assert_eq!(store.message_count(), 0);
    }
}
