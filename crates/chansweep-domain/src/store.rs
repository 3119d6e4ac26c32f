//! Trait seam for the chat platform's channel/message capability.
//!
//! The platform client itself lives outside this system; the engine only
//! needs the operations below. Implementations are expected to be cheap
//! to share (`&self` methods, interior mutability where needed).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Age boundary (days) for the platform's bulk-delete primitive.
///
/// Messages at or past this age must be deleted one at a time.
pub const BULK_DELETE_MAX_AGE_DAYS: i64 = 14;

/// Maximum message ids accepted by one batch-delete call.
pub const BULK_DELETE_BATCH: usize = 100;

/// A message as seen by the cleanup engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Platform message id
    pub id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Pinned messages are skipped unless pin-skipping is disabled
    #[serde(default)]
    pub pinned: bool,
}

/// Errors surfaced by a [`MessageStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The platform (guild/server) is unreachable. Treated as run-fatal.
    #[error("platform unreachable: {0}")]
    Unreachable(String),

    /// A channel-scoped failure. Isolated to the affected channel.
    #[error("channel '{channel}': {reason}")]
    Channel {
        /// Affected channel name
        channel: String,
        /// What went wrong
        reason: String,
    },

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Capability to list channels and fetch/delete messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// List category names currently present on the platform.
    async fn list_categories(&self) -> Result<Vec<String>, StoreError>;

    /// List channel names within a category.
    async fn list_channels(&self, category: &str) -> Result<Vec<String>, StoreError>;

    /// Fetch up to `limit` messages in reverse-chronological order,
    /// strictly older than the message identified by `before` (or the
    /// newest messages when `before` is `None`).
    async fn fetch_messages_before(
        &self,
        channel: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;

    /// Delete a single message.
    async fn delete_message(&self, channel: &str, id: &str) -> Result<(), StoreError>;

    /// Delete a batch of messages. The platform accepts only messages
    /// younger than [`BULK_DELETE_MAX_AGE_DAYS`] and at most
    /// [`BULK_DELETE_BATCH`] ids per call.
    async fn delete_batch(&self, channel: &str, ids: &[String]) -> Result<(), StoreError>;
}

impl StoreError {
    /// Whether this error aborts the whole run rather than one channel.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unreachable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(StoreError::Unreachable("gone".to_string()).is_fatal());
        assert!(!StoreError::Channel {
            channel: "general".to_string(),
            reason: "missing".to_string()
        }
        .is_fatal());
        assert!(!StoreError::Other("x".to_string()).is_fatal());
    }

    #[test]
    fn test_message_pinned_default() {
        let msg: Message =
            serde_json::from_str(r#"{"id":"1","created_at":"2026-01-01T00:00:00Z"}"#).unwrap();
        assert!(!msg.pinned);
    }
}
