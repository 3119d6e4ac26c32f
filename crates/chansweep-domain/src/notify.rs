//! Observer seam for run and discovery summaries.
//!
//! The engine hands completed run records to a [`Notifier`] and moves on;
//! delivery failures are logged by the caller and never affect run
//! outcome. Keeping this an explicit interface (rather than a global
//! event bus) keeps the engine testable in isolation from any transport.

use crate::run::CleanupRun;
use crate::sync::SyncReport;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from summary delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The target rejected or never received the payload
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Receiver of run and discovery summaries.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A cleanup run finished.
    async fn cleanup_complete(&self, run: &CleanupRun) -> Result<(), NotifyError>;

    /// A discovery pass or full sync changed configuration.
    async fn discovery_complete(&self, report: &SyncReport) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    async fn cleanup_complete(&self, run: &CleanupRun) -> Result<(), NotifyError> {
        (**self).cleanup_complete(run).await
    }

    async fn discovery_complete(&self, report: &SyncReport) -> Result<(), NotifyError> {
        (**self).discovery_complete(report).await
    }
}

/// No-op notifier for embedding and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn cleanup_complete(&self, _run: &CleanupRun) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn discovery_complete(&self, _report: &SyncReport) -> Result<(), NotifyError> {
        Ok(())
    }
}
