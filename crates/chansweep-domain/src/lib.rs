//! chansweep Domain Layer
//!
//! This crate contains the core domain model for chansweep: retention
//! semantics, the configuration shape, run records, rolling statistics,
//! and the trait interfaces the engine consumes.
//!
//! ## Key Concepts
//!
//! - **Retention**: days before a message becomes eligible for deletion;
//!   `-1` disables deletion, `0` makes everything eligible
//! - **Category**: a named group of channels sharing a default retention
//! - **ChannelEntry**: a bare channel name or a (name, override) pair
//! - **CleanupRun**: the immutable record of one cleanup execution
//! - **Stats**: bounded run history plus lifetime and per-entity counters
//!
//! ## Architecture
//!
//! Infrastructure lives elsewhere: the chat platform is consumed through
//! the [`MessageStore`] trait and outbound summaries go through the
//! [`Notifier`] trait. This crate holds pure logic only; nothing in it
//! performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod notify;
pub mod retention;
pub mod run;
pub mod stats;
pub mod store;
pub mod sync;

// Re-exports for convenience
pub use config::{Category, ChannelEntry, GlobalSettings, SweepConfig};
pub use notify::{Notifier, NotifyError, NullNotifier};
pub use retention::{resolve_retention, ResolvedRetention, RetentionSource};
pub use run::{CleanupRun, RunId, RunOptions, RunSummary, RunTrigger};
pub use stats::Stats;
pub use store::{Message, MessageStore, StoreError};
pub use sync::SyncReport;
