//! Lifecycle records
//!
//! One record per agent that has ever been promoted. The record tracks the
//! agent's position on the ladder, the probation deadline, and the outcome
//! of the most recent review. The cycle:
//!
//! ```text
//! promoted (UPGRADED) --deadline--> reviewed --> RETAINED (renewed)
//!                                           \-> DOWNGRADED (tier lowered)
//! ```
//!
//! Transitions are plain read-modify-write methods; the storage layer applies
//! the resulting record inside the agent's transaction.

use crate::agent::AgentId;
use crate::tier::Tier;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Review outcome state of a lifecycle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    /// Promotion granted, probation running
    Upgraded,
    /// Deadline reached, review not yet decided
    PendingReview,
    /// Review failed, tier lowered
    Downgraded,
    /// Review passed, probation renewed
    Retained,
}

/// Per-agent lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleRecord {
    /// Agent this record belongs to
    pub agent_id: AgentId,
    /// Rank the agent currently holds
    pub current_tier: Tier,
    /// Rank reached on the next promotion, if the ladder continues
    pub upgrade_tier: Option<Tier>,
    /// Rank to fall back to if retention fails, if the ladder continues
    pub downgraded_tier: Option<Tier>,
    /// When the current probation window ends
    pub review_deadline_at: DateTime<Utc>,
    /// When the promotion that opened this cycle was granted
    pub upgrade_granted_at: DateTime<Utc>,
    /// When the agent was last demoted, if ever
    pub downgraded_at: Option<DateTime<Utc>>,
    /// When the reviewer last looked at this record
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Current state
    pub status: LifecycleStatus,
}

impl LifecycleRecord {
    /// Open a new cycle after a promotion to `tier`.
    ///
    /// Upserted over any previous record for the agent: repeated promotions
    /// keep one row per agent.
    #[must_use]
    pub fn on_promotion(agent_id: AgentId, tier: Tier, now: DateTime<Utc>, probation: Duration) -> Self {
        Self {
            agent_id,
            current_tier: tier,
            upgrade_tier: tier.next_senior(),
            downgraded_tier: tier.next_junior(),
            review_deadline_at: now + probation,
            upgrade_granted_at: now,
            downgraded_at: None,
            last_checked_at: None,
            status: LifecycleStatus::Upgraded,
        }
    }

    /// Pass a review: keep the tier, renew the deadline.
    pub fn renew(&mut self, now: DateTime<Utc>, probation: Duration) {
        self.review_deadline_at = now + probation;
        self.last_checked_at = Some(now);
        self.status = LifecycleStatus::Retained;
    }

    /// Fail a review: fall back to the recorded demotion target.
    ///
    /// Returns the tier the agent now holds, or `None` when the record has
    /// no demotion path (the caller should renew instead).
    pub fn demote(&mut self, now: DateTime<Utc>, probation: Duration) -> Option<Tier> {
        let target = self.downgraded_tier?;
        self.upgrade_tier = Some(self.current_tier);
        self.current_tier = target;
        self.downgraded_tier = target.next_junior();
        self.downgraded_at = Some(now);
        self.review_deadline_at = now + probation;
        self.last_checked_at = Some(now);
        self.status = LifecycleStatus::Downgraded;
        Some(target)
    }
}
