//! chansweep Engine
//!
//! Cleanup orchestration and reconciliation: retention enforcement runs,
//! two-mode channel discovery, run statistics, and the cron scheduler.
//!
//! # Overview
//!
//! The engine drives one cleanup run at a time:
//! 1. Reload configuration (keeping the previous one on parse failure)
//! 2. Incremental discovery, so new channels are never silently skipped
//! 3. Per-channel sweep: resolve retention, page messages, partition at
//!    the platform's 14-day bulk-delete boundary, delete under caps and
//!    rate limits, isolate per-channel failures
//! 4. Record the run into bounded statistics and notify
//!
//! # Single-flight
//!
//! [`SweepService`] is the concurrency boundary: at most one
//! cleanup-or-sync operation is in flight process-wide; concurrent
//! triggers are rejected immediately with
//! [`EngineError::AlreadyRunning`], never queued.
//!
//! # Usage
//!
//! ```no_run
//! use chansweep_domain::{NullNotifier, RunOptions, RunTrigger};
//! use chansweep_engine::{Engine, SweepService};
//! # use chansweep_domain::{MessageStore, StoreError, Message};
//! # use async_trait::async_trait;
//! # struct MyStore;
//! # #[async_trait]
//! # impl MessageStore for MyStore {
//! #     async fn list_categories(&self) -> Result<Vec<String>, StoreError> { Ok(vec![]) }
//! #     async fn list_channels(&self, _: &str) -> Result<Vec<String>, StoreError> { Ok(vec![]) }
//! #     async fn fetch_messages_before(&self, _: &str, _: Option<&str>, _: usize)
//! #         -> Result<Vec<Message>, StoreError> { Ok(vec![]) }
//! #     async fn delete_message(&self, _: &str, _: &str) -> Result<(), StoreError> { Ok(()) }
//! #     async fn delete_batch(&self, _: &str, _: &[String]) -> Result<(), StoreError> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::new(MyStore, NullNotifier, "config.toml", "stats.json")?;
//!     let service = SweepService::new(engine);
//!
//!     let run = service.cleanup(RunOptions::new(RunTrigger::Manual)).await?;
//!     println!("purged {} messages", run.total_purged);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod cancel;
mod cleaner;
mod config_store;
mod discovery;
mod error;
mod fsutil;
mod scheduler;
mod service;
mod stats_store;

pub use cancel::CancelToken;
pub use cleaner::Engine;
pub use config_store::{ConfigStore, LoadedConfig, DISCOVERY_MARKER_KEY};
pub use discovery::{reconcile_full, reconcile_incremental, Listing};
pub use error::{EngineError, Result};
pub use scheduler::{next_occurrence, Scheduler};
pub use service::{StatusReport, SweepService};
pub use stats_store::StatsStore;
