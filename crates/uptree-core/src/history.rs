//! Promotion history
//!
//! Append-only log of promotion events, one row per agent per calendar
//! month. Each row carries the agent and sponsor as they looked before the
//! promotion, plus three independently-recorded step outcomes: `verify`,
//! `process`, and `change_parent`. Tree repair can fail or be skipped while
//! the promotion itself stands, so the outcomes never collapse into one.

use crate::agent::{AgentId, AgentSnapshot};
use crate::tier::Tier;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one processing step, recorded independently per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Status code (HTTP-style: 200 success, 400 skipped/refused)
    pub status_code: u16,
    /// Operator-readable explanation
    pub message: String,
}

impl StepOutcome {
    /// Successful step.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
        }
    }

    /// Step refused or skipped, promotion unaffected.
    #[must_use]
    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            status_code: 400,
            message: message.into(),
        }
    }

    /// Whether the step succeeded.
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

/// How the sponsor edge ended up after tree repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorChange {
    /// Existing sponsor already satisfied the ordering invariant
    Unchanged,
    /// Edge moved to a new qualifying ancestor
    Reassigned,
}

/// One promotion event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRecord {
    /// Record identifier
    pub id: Uuid,
    /// Promoted agent
    pub agent_id: AgentId,
    /// Agent as it looked before the promotion
    pub agent: AgentSnapshot,
    /// Sponsor id before the promotion, if any
    pub sponsor_id: Option<AgentId>,
    /// Sponsor as it looked before the promotion, if any
    pub sponsor: Option<AgentSnapshot>,
    /// Rank held before the promotion
    pub from_tier: Tier,
    /// Rank granted
    pub to_tier: Tier,
    /// Trailing-window revenue that justified the promotion (minor units)
    pub qualifying_revenue: i64,
    /// Candidate validation outcome
    pub verify: StepOutcome,
    /// Tier mutation outcome
    pub process: StepOutcome,
    /// Tree repair outcome; `None` until the resolver has run
    pub change_parent: Option<StepOutcome>,
    /// Edge disposition after repair; `None` until the resolver has run
    pub sponsor_change: Option<SponsorChange>,
    /// New sponsor id, set only when the edge was reassigned
    pub new_sponsor_id: Option<AgentId>,
    /// New sponsor snapshot, set only when the edge was reassigned
    pub new_sponsor: Option<AgentSnapshot>,
    /// When the promotion was committed
    pub created_at: DateTime<Utc>,
}

impl PromotionRecord {
    /// Build the entry committed alongside a promotion.
    ///
    /// `verify` and `process` start as successes; `change_parent` stays empty
    /// until the reparenting stage runs later in the day.
    #[must_use]
    pub fn granted(
        agent: AgentSnapshot,
        sponsor: Option<AgentSnapshot>,
        to_tier: Tier,
        qualifying_revenue: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: agent.id,
            sponsor_id: sponsor.as_ref().map(|s| s.id),
            from_tier: agent.tier,
            to_tier,
            qualifying_revenue,
            verify: StepOutcome::ok("candidate verified"),
            process: StepOutcome::ok("tier updated"),
            change_parent: None,
            sponsor_change: None,
            new_sponsor_id: None,
            new_sponsor: None,
            created_at: now,
            agent,
            sponsor,
        }
    }

    /// Calendar-month key used for the one-entry-per-month guard.
    #[inline]
    #[must_use]
    pub fn month_key(&self) -> (i32, u32) {
        (self.created_at.year(), self.created_at.month())
    }
}

/// Patch applied to a promotion record by the tree reparenting resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReparentOutcome {
    /// Record being patched
    pub record_id: Uuid,
    /// Repair outcome to store in `change_parent`
    pub change_parent: StepOutcome,
    /// Edge disposition
    pub sponsor_change: SponsorChange,
    /// New sponsor, present only when the edge moved
    pub new_sponsor: Option<AgentSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgencyId;
    use chrono::TimeZone;

    fn snapshot(id: u64, tier: Tier) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId(id),
            username: format!("agent{id}"),
            full_name: format!("Agent {id}"),
            tier,
            agency: AgencyId(15),
        }
    }

    #[test]
    fn granted_entry_starts_with_successful_steps() {
        let now = Utc.with_ymd_and_hms(2026, 4, 12, 0, 30, 0).unwrap();
        let rec = PromotionRecord::granted(
            snapshot(5, Tier::SalesAgent),
            Some(snapshot(2, Tier::SalesManager)),
            Tier::SalesManager,
            21_000_000,
            now,
        );

        assert!(rec.verify.is_ok());
        assert!(rec.process.is_ok());
        assert!(rec.change_parent.is_none());
        assert_eq!(rec.from_tier, Tier::SalesAgent);
        assert_eq!(rec.to_tier, Tier::SalesManager);
        assert_eq!(rec.sponsor_id, Some(AgentId(2)));
        assert_eq!(rec.month_key(), (2026, 4));
    }

    #[test]
    fn refused_step_is_not_ok() {
        assert!(!StepOutcome::refused("no qualifying ancestor").is_ok());
        assert_eq!(StepOutcome::refused("x").status_code, 400);
    }
}
