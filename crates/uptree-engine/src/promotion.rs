//! Promotion processor
//!
//! Validates and commits a single candidate's promotion. The whole write
//! (history entry, tier mutation, lifecycle upsert) is one ledger call and
//! therefore one transaction; tree repair runs later in the resolver stage,
//! so a repair failure never rolls back a committed promotion.

use crate::config::EngineConfig;
use crate::scanner::Candidate;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uptree_core::{
    DirectoryStore, EngineError, LifecycleRecord, PromotionCommit, PromotionRecord, Tier,
    TierLedger,
};

/// Commits one agent's promotion.
pub struct PromotionProcessor {
    directory: Arc<dyn DirectoryStore>,
    ledger: Arc<dyn TierLedger>,
    config: EngineConfig,
}

impl PromotionProcessor {
    /// Create a processor over the given directory and ledger.
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        ledger: Arc<dyn TierLedger>,
        config: EngineConfig,
    ) -> Self {
        Self {
            directory,
            ledger,
            config,
        }
    }

    /// Promote one candidate to the next tier on the ladder.
    ///
    /// Returns the tier granted.
    ///
    /// # Errors
    /// - [`EngineError::NotFound`]: agent missing or inactive
    /// - [`EngineError::UnsupportedTransition`]: already at the top of the ladder
    /// - [`EngineError::Conflict`]: an equivalent promotion already exists
    ///   this calendar month; nothing was written
    pub async fn process(
        &self,
        candidate: &Candidate,
        now: DateTime<Utc>,
    ) -> Result<Tier, EngineError> {
        let agent = self
            .directory
            .agent(candidate.agent_id)
            .await?
            .filter(|a| a.active)
            .ok_or(EngineError::NotFound(candidate.agent_id))?;

        let next = agent
            .tier
            .next_senior()
            .ok_or(EngineError::UnsupportedTransition(agent.tier))?;

        // Sponsor snapshot is best-effort: a dangling sponsor id just leaves
        // the history entry without one.
        let sponsor = match agent.sponsor {
            Some(sponsor_id) => self
                .directory
                .agent(sponsor_id)
                .await?
                .map(|p| p.snapshot()),
            None => None,
        };

        let history = PromotionRecord::granted(
            agent.snapshot(),
            sponsor,
            next,
            candidate.qualifying_revenue,
            now,
        );
        let lifecycle = LifecycleRecord::on_promotion(agent.id, next, now, self.config.probation());

        let applied = self
            .ledger
            .commit_promotion(PromotionCommit { history, lifecycle })
            .await?;
        if !applied {
            return Err(EngineError::Conflict {
                agent: agent.id,
                tier: next,
            });
        }

        tracing::info!(agent = %agent.id, from = %agent.tier, to = %next, "promotion committed");
        Ok(next)
    }
}
