//! Storage ports
//!
//! The engine touches the outside world only through these traits. Reads are
//! grouped per collaborator (revenue, directory, lifecycle, history); writes
//! live on a single ledger trait because every write shape is one per-agent
//! transaction that spans tables, and the trait method is the transaction
//! boundary: implementations must apply each commit all-or-nothing, at an
//! isolation level that never exposes a half-applied promotion.

use crate::agent::{AgencyId, AgentId, AgentProfile};
use crate::audit::AuditEntry;
use crate::history::{PromotionRecord, ReparentOutcome};
use crate::lifecycle::{LifecycleRecord, LifecycleStatus};
use crate::notice::Notice;
use crate::tier::Tier;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Failure at the storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row expected to exist is missing
    #[error("record not found: {0}")]
    Missing(String),
    /// Backend unreachable or query failed
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Write rejected by a constraint
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Read-only aggregate queries over per-agent daily revenue.
#[async_trait]
pub trait RevenueStore: Send + Sync {
    /// Sum of the agent's group revenue on days at or after `since`.
    async fn group_revenue_since(
        &self,
        agent: AgentId,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Agents at `tier` (optionally restricted to one agency) whose group
    /// revenue since `since` meets `bar`, with the qualifying sum.
    async fn agents_at_or_over(
        &self,
        tier: Tier,
        agency: Option<AgencyId>,
        since: DateTime<Utc>,
        bar: i64,
    ) -> Result<Vec<(AgentId, i64)>, StoreError>;
}

/// Reads over the agent directory and the referral tree.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Load one agent row.
    async fn agent(&self, id: AgentId) -> Result<Option<AgentProfile>, StoreError>;

    /// Ancestor chain, nearest first, at most `max_depth` rows.
    ///
    /// Implementations must bound the traversal themselves; a malformed
    /// (cyclic) edge set must not hang the query.
    async fn ancestors(&self, id: AgentId, max_depth: usize) -> Result<Vec<AgentProfile>, StoreError>;

    /// Agents whose sponsor edge points at `id`.
    async fn direct_descendants(&self, id: AgentId) -> Result<Vec<AgentProfile>, StoreError>;
}

/// Reads over lifecycle records.
#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// Load the record for one agent.
    async fn get(&self, agent: AgentId) -> Result<Option<LifecycleRecord>, StoreError>;

    /// Records whose review deadline falls on `day`.
    async fn due_for_review(&self, day: NaiveDate) -> Result<Vec<LifecycleRecord>, StoreError>;

    /// Records that transitioned into `status` on `day`: grant date for
    /// `Upgraded`, demotion date for `Downgraded`.
    async fn transitioned_on(
        &self,
        day: NaiveDate,
        status: LifecycleStatus,
    ) -> Result<Vec<LifecycleRecord>, StoreError>;
}

/// Reads over the promotion history log.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The agent's promotion entry created on `day`, if any.
    async fn find_on_day(
        &self,
        agent: AgentId,
        day: NaiveDate,
    ) -> Result<Option<PromotionRecord>, StoreError>;
}

/// Write set for one promotion: history row, tier mutation, lifecycle upsert.
#[derive(Debug, Clone)]
pub struct PromotionCommit {
    /// History entry to append
    pub history: PromotionRecord,
    /// Lifecycle record to upsert (one row per agent, merge on conflict)
    pub lifecycle: LifecycleRecord,
}

/// Write set for one demotion: tier rollback plus lifecycle update.
#[derive(Debug, Clone)]
pub struct DemotionCommit {
    /// Lifecycle record after [`LifecycleRecord::demote`]; `current_tier`
    /// is the tier the agent row must be set to
    pub lifecycle: LifecycleRecord,
}

/// Write set for one sponsor reassignment.
#[derive(Debug, Clone)]
pub struct ReparentCommit {
    /// Agent whose edge moves
    pub agent_id: AgentId,
    /// New sponsor (must be strictly senior to the agent)
    pub new_sponsor: AgentId,
    /// Promotion-history patch, present for promotion repair
    pub history: Option<ReparentOutcome>,
    /// Audit entry, present for demotion repair
    pub audit: Option<AuditEntry>,
}

/// The transactional write surface.
///
/// Each method is one atomic per-agent transaction. No cross-agent locking
/// is required: every commit only touches rows keyed by its own agent id.
#[async_trait]
pub trait TierLedger: Send + Sync {
    /// Commit a promotion.
    ///
    /// Returns `false` without writing anything when a history entry for the
    /// same agent, same calendar month, and same target tier already exists.
    /// Batch re-runs rely on this for idempotency.
    async fn commit_promotion(&self, commit: PromotionCommit) -> Result<bool, StoreError>;

    /// Upsert a renewed lifecycle record after a passed review.
    async fn commit_retention(&self, record: LifecycleRecord) -> Result<(), StoreError>;

    /// Commit a demotion: agent tier back to `lifecycle.current_tier` plus
    /// the lifecycle update.
    async fn commit_demotion(&self, commit: DemotionCommit) -> Result<(), StoreError>;

    /// Commit a sponsor reassignment with its history patch and/or audit row.
    async fn commit_reparent(&self, commit: ReparentCommit) -> Result<(), StoreError>;

    /// Record a repair outcome that moved nothing (already-valid sponsor, or
    /// no qualifying ancestor): history patch only.
    async fn record_repair_outcome(&self, outcome: ReparentOutcome) -> Result<(), StoreError>;
}

/// Outbound notification dispatch.
///
/// Fire-and-forget from the engine's point of view: a dispatch failure is
/// logged and never rolls back or re-triggers a tier mutation.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hand one notice to the delivery substrate.
    async fn dispatch(&self, notice: Notice) -> Result<(), StoreError>;
}
