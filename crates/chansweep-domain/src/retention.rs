//! Retention semantics and the three-tier resolver.
//!
//! Effective retention for a channel is resolved from, in order of
//! precedence: an inline per-channel override, the category default, and
//! the global default. Resolution never fails; invalid values fall back
//! to the global default with a warning.

use crate::config::Category;
use serde::{Deserialize, Serialize};

/// Retention value meaning "never delete".
pub const RETENTION_NEVER: i64 = -1;

/// Compiled-in fallback used when even the global default is invalid.
pub const FALLBACK_RETENTION_DAYS: i64 = 7;

/// Check whether a retention value satisfies the `integer >= -1` invariant.
pub fn is_valid_retention(days: i64) -> bool {
    days >= RETENTION_NEVER
}

/// Which tier of the override hierarchy supplied the resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionSource {
    /// Inline per-channel override in the category's channel list
    Override,

    /// Category-level default retention
    Category,

    /// Global default retention
    Global,
}

impl RetentionSource {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionSource::Override => "override",
            RetentionSource::Category => "category",
            RetentionSource::Global => "global",
        }
    }
}

/// Outcome of retention resolution for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRetention {
    /// Effective retention in days (`>= -1` always)
    pub days: i64,

    /// Which tier supplied the value
    pub source: RetentionSource,
}

/// Resolve the effective retention for `channel` within `category`.
///
/// Lookup order: inline channel override, category default, global
/// default. Any candidate failing the `>= -1` constraint is replaced by
/// the global default (itself coerced to [`FALLBACK_RETENTION_DAYS`] if
/// invalid) and a warning is emitted. This function never fails a run.
pub fn resolve_retention(
    global_default: i64,
    category: &Category,
    channel: &str,
) -> ResolvedRetention {
    let global = if is_valid_retention(global_default) {
        global_default
    } else {
        tracing::warn!(
            value = global_default,
            fallback = FALLBACK_RETENTION_DAYS,
            "Invalid global default retention, using compiled fallback"
        );
        FALLBACK_RETENTION_DAYS
    };

    let (candidate, source) = if let Some(days) = category.override_for(channel) {
        (days, RetentionSource::Override)
    } else if let Some(days) = category.default_retention_days {
        (days, RetentionSource::Category)
    } else {
        (global, RetentionSource::Global)
    };

    if is_valid_retention(candidate) {
        ResolvedRetention {
            days: candidate,
            source,
        }
    } else {
        tracing::warn!(
            channel = channel,
            value = candidate,
            source = source.as_str(),
            "Invalid retention value, falling back to global default"
        );
        ResolvedRetention {
            days: global,
            source: RetentionSource::Global,
        }
    }
}
