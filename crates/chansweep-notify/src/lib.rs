//! chansweep Notification Layer
//!
//! Webhook delivery of cleanup-run and discovery summaries. Each summary
//! kind routes to its own configured target; an unconfigured target
//! means that kind is simply not delivered.
//!
//! Delivery is strictly best-effort: the engine logs a failed delivery
//! and moves on, so nothing in this crate may block or abort a run.

#![warn(missing_docs)]

mod webhook;

pub use webhook::{WebhookNotifier, DESCRIPTION_LIMIT};
