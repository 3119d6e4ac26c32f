//! Cleanup orchestrator: drives one retention-enforcement run.

use crate::cancel::CancelToken;
use crate::config_store::ConfigStore;
use crate::discovery::{reconcile_full, reconcile_incremental, Listing};
use crate::error::{EngineError, Result};
use crate::stats_store::StatsStore;
use chansweep_domain::config::LimitSettings;
use chansweep_domain::notify::Notifier;
use chansweep_domain::retention::{resolve_retention, ResolvedRetention, RETENTION_NEVER};
use chansweep_domain::run::{
    CategorySummary, ChannelOutcome, CleanupRun, RunId, RunOptions,
};
use chansweep_domain::stats::Stats;
use chansweep_domain::store::{
    Message, MessageStore, StoreError, BULK_DELETE_BATCH, BULK_DELETE_MAX_AGE_DAYS,
};
use chansweep_domain::sync::SyncReport;
use chansweep_domain::SweepConfig;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Eligible messages split at the platform's 14-day bulk-delete boundary.
#[derive(Debug, Default, PartialEq, Eq)]
struct Partition {
    /// Younger than 14 days: deletable through batch calls
    bulk: Vec<String>,

    /// 14 days or older: deletable one at a time only
    individual: Vec<String>,
}

/// Partition `messages` into bulk- and individually-eligible sets.
///
/// A message is eligible when it is strictly older than the retention
/// cutoff and not excluded by pin-skipping. A message aged exactly 14
/// days lands in the individual set: the bulk primitive accepts only
/// strictly-younger messages.
fn partition_eligible(
    messages: &[Message],
    retention_days: i64,
    skip_pinned: bool,
    now: DateTime<Utc>,
) -> Partition {
    let cutoff = retention_cutoff(now, retention_days);
    let bulk_cutoff = now - Duration::days(BULK_DELETE_MAX_AGE_DAYS);

    let mut partition = Partition::default();
    for message in messages {
        if message.created_at >= cutoff {
            continue;
        }
        if message.pinned && skip_pinned {
            continue;
        }
        if message.created_at > bulk_cutoff {
            partition.bulk.push(message.id.clone());
        } else {
            partition.individual.push(message.id.clone());
        }
    }
    partition
}

/// Cutoff timestamp for a retention period, saturating on absurd values.
fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    Duration::try_days(retention_days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Apply the per-channel individual-delete cap: (deletable now, remaining).
fn cap_individual(total: usize, cap: usize) -> (usize, usize) {
    let take = total.min(cap);
    (take, total - take)
}

/// Cleanup orchestration engine.
///
/// Owns the in-memory configuration (replaced wholesale on reload) and
/// the statistics handle. One run executes to completion between await
/// points; concurrency control lives in [`crate::SweepService`].
pub struct Engine<S, N> {
    store: S,
    notifier: N,
    config_store: ConfigStore,
    stats_store: StatsStore,
    config: SweepConfig,
    extras: toml::Table,
    discovery_complete: bool,
    pending_migrated: usize,
    stats: Arc<RwLock<Stats>>,
}

impl<S: MessageStore, N: Notifier> Engine<S, N> {
    /// Create an engine over a message store and notifier, loading the
    /// configuration and statistics documents.
    pub fn new(
        store: S,
        notifier: N,
        config_path: impl Into<PathBuf>,
        stats_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let config_store = ConfigStore::new(config_path);
        let stats_store = StatsStore::new(stats_path);
        let loaded = config_store.load()?;
        let stats = stats_store.load();

        Ok(Self {
            store,
            notifier,
            config_store,
            stats_store,
            config: loaded.config,
            extras: loaded.extras,
            discovery_complete: loaded.discovery_complete,
            pending_migrated: loaded.migrated_overrides,
            stats: Arc::new(RwLock::new(stats)),
        })
    }

    /// Current in-memory configuration.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// The underlying message store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying message store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Shared handle to the statistics document.
    pub fn stats_handle(&self) -> Arc<RwLock<Stats>> {
        Arc::clone(&self.stats)
    }

    /// Execute one cleanup run.
    ///
    /// Never returns `Err` for per-channel failures or a fatal platform
    /// outage; both are reported through the returned [`CleanupRun`].
    pub async fn run_cleanup(
        &mut self,
        opts: RunOptions,
        cancel: &CancelToken,
    ) -> Result<CleanupRun> {
        let id = RunId::new();
        let started_at = Utc::now();
        let timer = Instant::now();
        tracing::info!(run = %id, trigger = opts.trigger.as_str(), "Cleanup run starting");

        if let Err(e) = self.reload_config() {
            tracing::warn!(error = %e, "Config reload failed, keeping previous configuration");
        }
        let dry_run = opts.dry_run.unwrap_or(self.config.settings.dry_run);

        // Discovery first, so new channels are never silently skipped.
        let listing = match Listing::fetch(&self.store).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::error!(error = %e, "Platform unreachable, aborting run");
                let run = fatal_run(id, started_at, &opts, dry_run, e.to_string(), &timer);
                self.record_and_notify(&run).await;
                return Ok(run);
            }
        };
        self.apply_incremental(&listing).await;

        let config = self.config.clone();
        let limits = &config.settings.limits;

        let mut categories = Vec::new();
        let mut channels_processed = 0u64;
        let mut total_purged = 0u64;
        let mut total_errors = 0u64;
        let mut cancelled = false;

        for (name, category) in &config.categories {
            if cancelled {
                break;
            }
            if !category.enabled {
                tracing::debug!(category = name.as_str(), "Category disabled, skipping");
                continue;
            }
            if opts.category.as_deref().is_some_and(|f| f != name) {
                continue;
            }

            let mut outcomes = Vec::new();
            for entry in &category.channels {
                if opts.channel.as_deref().is_some_and(|f| f != entry.name()) {
                    continue;
                }
                // Cancellation is polled here, between channels, only.
                if cancel.is_cancelled() {
                    tracing::info!("Cancellation observed, stopping run");
                    cancelled = true;
                    break;
                }

                channels_processed += 1;
                let resolved = resolve_retention(
                    config.settings.default_retention_days,
                    category,
                    entry.name(),
                );
                let outcome = self
                    .sweep_channel(limits, resolved, entry.name(), dry_run)
                    .await;
                outcomes.push(outcome);

                if limits.channel_delay_ms > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(limits.channel_delay_ms))
                        .await;
                }
            }

            let purged: u64 = outcomes.iter().map(ChannelOutcome::purged).sum();
            let errors = outcomes.iter().filter(|o| o.error.is_some()).count() as u64;
            total_purged += purged;
            total_errors += errors;

            let summary = CategorySummary {
                name: name.clone(),
                channels: outcomes,
                purged,
                errors,
            };
            // Quiet categories are suppressed from the run record.
            if !summary.is_quiet() {
                categories.push(summary);
            }
        }

        let run = CleanupRun {
            id,
            started_at,
            trigger: opts.trigger,
            dry_run,
            categories,
            channels_processed,
            total_purged,
            total_errors,
            duration_ms: timer.elapsed().as_millis() as u64,
            cancelled,
            fatal_error: None,
        };
        tracing::info!(
            run = %id,
            purged = run.total_purged,
            errors = run.total_errors,
            cancelled = run.cancelled,
            dry_run = run.dry_run,
            "Cleanup run finished"
        );

        self.record_and_notify(&run).await;
        Ok(run)
    }

    /// Full sync: additive and subtractive reconciliation.
    ///
    /// Configuration is written only when at least one change was made,
    /// so a no-op sync never produces a new file version.
    pub async fn full_sync(&mut self) -> Result<SyncReport> {
        tracing::info!("Full sync starting");
        if let Err(e) = self.reload_config() {
            tracing::warn!(error = %e, "Config reload failed, keeping previous configuration");
        }

        let listing = Listing::fetch(&self.store).await.map_err(|e| match e {
            StoreError::Unreachable(msg) => EngineError::Unreachable(msg),
            other => EngineError::Store(other.to_string()),
        })?;

        let mut report = reconcile_full(&mut self.config, &listing);
        report.migrated_overrides = std::mem::take(&mut self.pending_migrated);

        if !report.is_empty() {
            self.discovery_complete = true;
            self.config_store
                .save(&self.config, &self.extras, self.discovery_complete)?;
            if let Err(e) = self.notifier.discovery_complete(&report).await {
                tracing::warn!(error = %e, "Discovery notification failed");
            }
        }
        tracing::info!(changes = report.change_count(), "Full sync finished");
        Ok(report)
    }

    /// Incremental discovery plus marker bookkeeping.
    ///
    /// The first completed pass is silent (avoids startup noise); later
    /// passes notify when they changed anything.
    async fn apply_incremental(&mut self, listing: &Listing) {
        let first_pass = !self.discovery_complete;
        let mut report = reconcile_incremental(&mut self.config, listing);
        let changed = !report.is_empty();

        if changed || first_pass {
            self.discovery_complete = true;
            if let Err(e) = self.config_store.save(&self.config, &self.extras, true) {
                tracing::warn!(error = %e, "Failed to persist configuration after discovery");
            }
        }
        if changed && !first_pass {
            // The save above also persisted any pending overrides
            // migration; this notification carries its count.
            report.migrated_overrides = std::mem::take(&mut self.pending_migrated);
            if let Err(e) = self.notifier.discovery_complete(&report).await {
                tracing::warn!(error = %e, "Discovery notification failed");
            }
        }
    }

    /// Reload configuration from durable storage, replacing the
    /// in-memory structure wholesale.
    fn reload_config(&mut self) -> Result<()> {
        let loaded = self.config_store.load()?;
        self.config = loaded.config;
        self.extras = loaded.extras;
        self.discovery_complete = loaded.discovery_complete;
        // A save between loads drops the deprecated overrides key from
        // disk, so a later load reports zero; the pending count is kept
        // until a sync report or discovery notification carries it.
        self.pending_migrated = self.pending_migrated.max(loaded.migrated_overrides);
        Ok(())
    }

    /// Sweep one channel, isolating any failure into the outcome.
    async fn sweep_channel(
        &self,
        limits: &LimitSettings,
        resolved: ResolvedRetention,
        channel: &str,
        dry_run: bool,
    ) -> ChannelOutcome {
        let mut outcome = ChannelOutcome {
            channel: channel.to_string(),
            retention_days: resolved.days,
            retention_source: resolved.source,
            deleted_bulk: 0,
            deleted_individual: 0,
            remaining: 0,
            skipped: false,
            error: None,
        };

        if resolved.days == RETENTION_NEVER {
            tracing::debug!(channel, "Retention disabled, skipping channel");
            outcome.skipped = true;
            return outcome;
        }

        if let Err(e) = self
            .sweep_channel_inner(limits, resolved.days, channel, dry_run, &mut outcome)
            .await
        {
            tracing::warn!(channel, error = %e, "Channel sweep failed, continuing");
            outcome.error = Some(e.to_string());
        }
        outcome
    }

    async fn sweep_channel_inner(
        &self,
        limits: &LimitSettings,
        retention_days: i64,
        channel: &str,
        dry_run: bool,
        outcome: &mut ChannelOutcome,
    ) -> std::result::Result<(), StoreError> {
        let now = Utc::now();

        // Page until exhausted or the per-channel fetch ceiling is hit.
        let mut messages: Vec<Message> = Vec::new();
        let mut before: Option<String> = None;
        loop {
            let budget = limits.fetch_ceiling - messages.len();
            if budget == 0 {
                break;
            }
            let limit = limits.page_size.min(budget);
            let page = self
                .store
                .fetch_messages_before(channel, before.as_deref(), limit)
                .await?;
            if page.is_empty() {
                break;
            }
            before = page.last().map(|m| m.id.clone());
            let got = page.len();
            messages.extend(page);
            if got < limit {
                break;
            }
        }

        let partition = partition_eligible(&messages, retention_days, limits.skip_pinned, now);
        let (take, remaining) =
            cap_individual(partition.individual.len(), limits.max_individual_deletes);
        outcome.remaining = remaining as u64;

        if dry_run {
            // Same cap arithmetic as live mode, so the counts match what
            // a subsequent live run would actually delete.
            outcome.deleted_bulk = partition.bulk.len() as u64;
            outcome.deleted_individual = take as u64;
            return Ok(());
        }

        for chunk in partition.bulk.chunks(BULK_DELETE_BATCH) {
            if chunk.len() == 1 {
                self.store.delete_message(channel, &chunk[0]).await?;
            } else {
                self.store.delete_batch(channel, chunk).await?;
            }
            outcome.deleted_bulk += chunk.len() as u64;
        }

        for id in partition.individual.iter().take(take) {
            self.store.delete_message(channel, id).await?;
            outcome.deleted_individual += 1;
            if limits.delete_delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(limits.delete_delay_ms))
                    .await;
            }
        }
        Ok(())
    }

    /// Record the run into stats (atomic write) and notify. Neither a
    /// persistence nor a delivery failure affects the run outcome.
    async fn record_and_notify(&mut self, run: &CleanupRun) {
        let snapshot = {
            let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
            stats.record(run);
            stats.clone()
        };
        if let Err(e) = self.stats_store.save(&snapshot) {
            tracing::warn!(error = %e, "Failed to persist run statistics");
        }
        if let Err(e) = self.notifier.cleanup_complete(run).await {
            tracing::warn!(error = %e, "Cleanup notification failed");
        }
    }
}

/// Zero-progress failed run for a run-level fatal error.
fn fatal_run(
    id: RunId,
    started_at: DateTime<Utc>,
    opts: &RunOptions,
    dry_run: bool,
    error: String,
    timer: &Instant,
) -> CleanupRun {
    CleanupRun {
        id,
        started_at,
        trigger: opts.trigger,
        dry_run,
        categories: Vec::new(),
        channels_processed: 0,
        total_purged: 0,
        total_errors: 1,
        duration_ms: timer.elapsed().as_millis() as u64,
        cancelled: false,
        fatal_error: Some(error),
    }
}
