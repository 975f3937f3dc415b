//! Retention reviewer
//!
//! Evaluates agents whose probation deadline has arrived. Tiers without a
//! configured retention bar (and records with no demotion path) retain
//! unconditionally; everyone else must have held the bar since the grant or
//! fall back to the recorded demotion target.

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uptree_core::{
    DemotionCommit, EngineError, LifecycleRecord, LifecycleStore, RevenueStore, Tier, TierLedger,
};

/// Outcome of one review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Bar met (or no bar): deadline renewed
    Retained,
    /// Bar missed: tier lowered to the contained value
    Demoted(Tier),
}

/// Reviews lifecycle records due today.
pub struct RetentionReviewer {
    revenue: Arc<dyn RevenueStore>,
    lifecycle: Arc<dyn LifecycleStore>,
    ledger: Arc<dyn TierLedger>,
    config: EngineConfig,
}

impl RetentionReviewer {
    /// Create a reviewer over the given stores.
    #[must_use]
    pub fn new(
        revenue: Arc<dyn RevenueStore>,
        lifecycle: Arc<dyn LifecycleStore>,
        ledger: Arc<dyn TierLedger>,
        config: EngineConfig,
    ) -> Self {
        Self {
            revenue,
            lifecycle,
            ledger,
            config,
        }
    }

    /// Records whose review deadline falls on the run day.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<LifecycleRecord>, EngineError> {
        Ok(self.lifecycle.due_for_review(now.date_naive()).await?)
    }

    /// Review one record.
    ///
    /// Renewal and demotion each commit through the ledger; the record passed
    /// in is the pre-review state read by [`Self::due`].
    pub async fn review(
        &self,
        mut record: LifecycleRecord,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, EngineError> {
        // A record with no demotion path, or a tier with no configured bar,
        // retains indefinitely.
        let bar = match (record.downgraded_tier, self.config.retention_bar(record.current_tier)) {
            (Some(_), Some(bar)) => bar,
            _ => {
                record.renew(now, self.config.probation());
                self.ledger.commit_retention(record.clone()).await?;
                tracing::debug!(agent = %record.agent_id, tier = %record.current_tier, "retained without bar");
                return Ok(ReviewOutcome::Retained);
            }
        };

        let earned = self
            .revenue
            .group_revenue_since(record.agent_id, record.upgrade_granted_at)
            .await?;

        if earned >= bar {
            record.renew(now, self.config.probation());
            self.ledger.commit_retention(record.clone()).await?;
            tracing::info!(agent = %record.agent_id, tier = %record.current_tier, earned, bar, "retention passed");
            return Ok(ReviewOutcome::Retained);
        }

        // demote() cannot return None here: the bar match required a target.
        let target = record
            .demote(now, self.config.probation())
            .ok_or(EngineError::UnsupportedTransition(record.current_tier))?;
        self.ledger
            .commit_demotion(DemotionCommit {
                lifecycle: record.clone(),
            })
            .await?;
        tracing::info!(agent = %record.agent_id, to = %target, earned, bar, "retention failed, demoted");
        Ok(ReviewOutcome::Demoted(target))
    }
}
