//! Lifecycle engine facade
//!
//! Wires the four stages together behind the idempotent entry points the
//! scheduler calls. Stage order inside a run is fixed: scan/promote, then
//! review/demote, then tree repair, then notices. Each stage reads state
//! the previous one has already durably committed.
//!
//! Per-agent failures never halt a stage; they are recorded in the returned
//! report and the batch moves on. Only a failure to read a whole candidate
//! set fails a stage.

use crate::config::EngineConfig;
use crate::notify::NotificationDriver;
use crate::promotion::PromotionProcessor;
use crate::reparent::{RepairOutcome, TreeReparenter};
use crate::report::{DailySummary, RunReport};
use crate::retention::RetentionReviewer;
use crate::scanner::ThresholdScanner;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uptree_core::{
    AgentId, DirectoryStore, EngineError, HistoryStore, LifecycleStatus, LifecycleStore, Notifier,
    RevenueStore, TierLedger,
};

/// The tier lifecycle & tree-reparenting engine.
///
/// All collaborators are constructor-injected trait objects so every stage
/// can be exercised against in-memory fakes.
pub struct LifecycleEngine {
    config: EngineConfig,
    lifecycle: Arc<dyn LifecycleStore>,
    scanner: ThresholdScanner,
    promoter: PromotionProcessor,
    reviewer: RetentionReviewer,
    reparenter: TreeReparenter,
    notify: NotificationDriver,
}

impl LifecycleEngine {
    /// Wire an engine to its collaborators.
    #[must_use]
    pub fn new(
        revenue: Arc<dyn RevenueStore>,
        directory: Arc<dyn DirectoryStore>,
        lifecycle: Arc<dyn LifecycleStore>,
        history: Arc<dyn HistoryStore>,
        ledger: Arc<dyn TierLedger>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            scanner: ThresholdScanner::new(Arc::clone(&revenue), config.clone()),
            promoter: PromotionProcessor::new(
                Arc::clone(&directory),
                Arc::clone(&ledger),
                config.clone(),
            ),
            reviewer: RetentionReviewer::new(
                revenue,
                Arc::clone(&lifecycle),
                Arc::clone(&ledger),
                config.clone(),
            ),
            reparenter: TreeReparenter::new(
                Arc::clone(&directory),
                history,
                ledger,
                config.clone(),
            ),
            notify: NotificationDriver::new(
                Arc::clone(&lifecycle),
                directory,
                notifier,
                config.clone(),
            ),
            lifecycle,
            config,
        }
    }

    /// Scan thresholds and promote qualifying agents.
    ///
    /// Passes run most-junior tier first, and each pass's promotions commit
    /// before the next pass is read: an agent promoted by pass N already
    /// holds its new tier when pass N+1 queries, and the exclusion set stops
    /// it from promoting twice in one run.
    ///
    /// # Errors
    /// Only a failed pass query fails the stage.
    pub async fn run_promotion_scan(&self, now: DateTime<Utc>) -> Result<RunReport, EngineError> {
        tracing::info!(day = %now.date_naive(), "promotion scan starting");
        let mut report = RunReport::new();
        let mut selected: HashSet<AgentId> = HashSet::new();

        for rule in self.config.promotion_passes.clone() {
            let candidates = self.scanner.scan_pass(&rule, now, &selected).await?;
            for candidate in candidates {
                selected.insert(candidate.agent_id);
                match self.promoter.process(&candidate, now).await {
                    Ok(_) => report.record_processed(),
                    Err(e) if e.is_conflict() => {
                        tracing::debug!(agent = %candidate.agent_id, "promotion already recorded this month");
                        report.record_skipped();
                    }
                    Err(e) => {
                        tracing::error!(agent = %candidate.agent_id, error = %e, "promotion failed");
                        report.record_failure(candidate.agent_id, e.reason());
                    }
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed.len(),
            "promotion scan finished"
        );
        Ok(report)
    }

    /// Review every lifecycle record due today; renew or demote.
    ///
    /// # Errors
    /// Only a failure to read the due set fails the stage.
    pub async fn run_retention_review(&self, now: DateTime<Utc>) -> Result<RunReport, EngineError> {
        tracing::info!(day = %now.date_naive(), "retention review starting");
        let mut report = RunReport::new();

        for record in self.reviewer.due(now).await? {
            let agent_id = record.agent_id;
            match self.reviewer.review(record, now).await {
                Ok(_) => report.record_processed(),
                Err(e) => {
                    tracing::error!(agent = %agent_id, error = %e, "review failed");
                    report.record_failure(agent_id, e.reason());
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            failed = report.failed.len(),
            "retention review finished"
        );
        Ok(report)
    }

    /// Repair sponsor edges invalidated by today's promotions and demotions.
    ///
    /// # Errors
    /// Only a failure to read the day's transition sets fails the stage.
    pub async fn run_tree_repair(&self, now: DateTime<Utc>) -> Result<RunReport, EngineError> {
        tracing::info!(day = %now.date_naive(), "tree repair starting");
        let day = now.date_naive();
        let mut report = RunReport::new();

        let upgraded = self
            .lifecycle
            .transitioned_on(day, LifecycleStatus::Upgraded)
            .await?;
        for record in upgraded {
            match self.reparenter.repair_promoted(&record, now).await {
                Ok(RepairOutcome::Reassigned { .. } | RepairOutcome::AlreadyValid) => {
                    report.record_processed();
                }
                Ok(RepairOutcome::Unresolved | RepairOutcome::Skipped) => report.record_skipped(),
                Err(e) => {
                    tracing::error!(agent = %record.agent_id, error = %e, "promotion repair failed");
                    report.record_failure(record.agent_id, e.reason());
                }
            }
        }

        let downgraded = self
            .lifecycle
            .transitioned_on(day, LifecycleStatus::Downgraded)
            .await?;
        for record in downgraded {
            match self.reparenter.repair_demoted(&record, now).await {
                Ok(outcomes) => {
                    for (_, outcome) in outcomes {
                        match outcome {
                            RepairOutcome::Reassigned { .. } => report.record_processed(),
                            _ => report.record_skipped(),
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(agent = %record.agent_id, error = %e, "demotion repair failed");
                    report.record_failure(record.agent_id, e.reason());
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed.len(),
            "tree repair finished"
        );
        Ok(report)
    }

    /// Emit notices for today's tier transitions.
    ///
    /// # Errors
    /// Only a failure to read the transition sets fails the stage.
    pub async fn run_notifications(&self, now: DateTime<Utc>) -> Result<RunReport, EngineError> {
        tracing::info!(day = %now.date_naive(), "notification dispatch starting");
        self.notify.run(now).await
    }

    /// Run the four stages in order, as the daily trigger does.
    ///
    /// # Errors
    /// A stage-level failure aborts the remaining stages; completed stages
    /// have already committed and a re-run is safe.
    pub async fn run_daily(&self, now: DateTime<Utc>) -> Result<DailySummary, EngineError> {
        Ok(DailySummary {
            promotion: self.run_promotion_scan(now).await?,
            review: self.run_retention_review(now).await?,
            repair: self.run_tree_repair(now).await?,
            notify: self.run_notifications(now).await?,
        })
    }

    /// Engine configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The scanner, for dry-run candidate listings.
    #[inline]
    #[must_use]
    pub fn scanner(&self) -> &ThresholdScanner {
        &self.scanner
    }
}
