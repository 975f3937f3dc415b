//! Testing utilities for the uptree workspace
//!
//! One in-memory backend implements every storage port, so a test wires a
//! whole engine from a single `Arc<MemoryBackend>`. Ledger commits mirror
//! the transactional contract: each commit applies all of its writes under
//! one lock, or none of them when a failure is injected.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use uptree_core::{
    AgencyId, AgentId, AgentProfile, AuditEntry, DemotionCommit, DirectoryStore, HistoryStore,
    LifecycleRecord, LifecycleStatus, LifecycleStore, Notice, Notifier, PromotionCommit,
    PromotionRecord, ReparentCommit, ReparentOutcome, RevenueStore, StoreError, Tier, TierLedger,
};

/// Build a plain active profile; tests mutate the fields they care about.
pub fn profile(id: u64, tier: Tier) -> AgentProfile {
    AgentProfile {
        id: AgentId(id),
        username: format!("agent{id}"),
        full_name: format!("Agent {id}"),
        email: None,
        tier,
        agency: AgencyId(15),
        sponsor: None,
        active: true,
    }
}

#[derive(Debug, Clone)]
struct RevenueRow {
    agent_id: AgentId,
    day: NaiveDate,
    amount: i64,
}

#[derive(Default)]
struct Inner {
    agents: BTreeMap<u64, AgentProfile>,
    revenue: Vec<RevenueRow>,
    lifecycle: BTreeMap<u64, LifecycleRecord>,
    history: Vec<PromotionRecord>,
    audit: Vec<AuditEntry>,
    fail_agents: HashSet<AgentId>,
}

/// In-memory implementation of every storage port.
#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_agent(&self, agent: AgentProfile) {
        self.inner.lock().agents.insert(agent.id.0, agent);
    }

    /// Point `child`'s sponsor edge at `sponsor`.
    pub fn link(&self, child: AgentId, sponsor: AgentId) {
        if let Some(agent) = self.inner.lock().agents.get_mut(&child.0) {
            agent.sponsor = Some(sponsor);
        }
    }

    pub fn add_revenue(&self, agent_id: AgentId, day: NaiveDate, amount: i64) {
        self.inner.lock().revenue.push(RevenueRow {
            agent_id,
            day,
            amount,
        });
    }

    pub fn insert_lifecycle(&self, record: LifecycleRecord) {
        self.inner
            .lock()
            .lifecycle
            .insert(record.agent_id.0, record);
    }

    pub fn insert_history(&self, record: PromotionRecord) {
        self.inner.lock().history.push(record);
    }

    /// Make every ledger commit and revenue sum for this agent fail.
    pub fn fail_agent(&self, agent_id: AgentId) {
        self.inner.lock().fail_agents.insert(agent_id);
    }

    pub fn agent(&self, id: AgentId) -> Option<AgentProfile> {
        self.inner.lock().agents.get(&id.0).cloned()
    }

    pub fn tier_of(&self, id: AgentId) -> Option<Tier> {
        self.agent(id).map(|a| a.tier)
    }

    pub fn sponsor_of(&self, id: AgentId) -> Option<AgentId> {
        self.agent(id).and_then(|a| a.sponsor)
    }

    pub fn lifecycle_of(&self, id: AgentId) -> Option<LifecycleRecord> {
        self.inner.lock().lifecycle.get(&id.0).cloned()
    }

    pub fn history_of(&self, id: AgentId) -> Vec<PromotionRecord> {
        self.inner
            .lock()
            .history
            .iter()
            .filter(|h| h.agent_id == id)
            .cloned()
            .collect()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().audit.clone()
    }

    /// All agent profiles, for invariant sweeps.
    pub fn all_agents(&self) -> Vec<AgentProfile> {
        self.inner.lock().agents.values().cloned().collect()
    }

    fn check_fail(inner: &Inner, agent: AgentId) -> Result<(), StoreError> {
        if inner.fail_agents.contains(&agent) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for agent {agent}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RevenueStore for MemoryBackend {
    async fn group_revenue_since(
        &self,
        agent: AgentId,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let inner = self.inner.lock();
        Self::check_fail(&inner, agent)?;
        let since_day = since.date_naive();
        Ok(inner
            .revenue
            .iter()
            .filter(|row| row.agent_id == agent && row.day >= since_day)
            .map(|row| row.amount)
            .sum())
    }

    async fn agents_at_or_over(
        &self,
        tier: Tier,
        agency: Option<AgencyId>,
        since: DateTime<Utc>,
        bar: i64,
    ) -> Result<Vec<(AgentId, i64)>, StoreError> {
        let inner = self.inner.lock();
        let since_day = since.date_naive();
        let mut out = Vec::new();
        for agent in inner.agents.values() {
            if agent.tier != tier {
                continue;
            }
            if let Some(scope) = agency {
                if agent.agency != scope {
                    continue;
                }
            }
            let sum: i64 = inner
                .revenue
                .iter()
                .filter(|row| row.agent_id == agent.id && row.day >= since_day)
                .map(|row| row.amount)
                .sum();
            if sum >= bar {
                out.push((agent.id, sum));
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl DirectoryStore for MemoryBackend {
    async fn agent(&self, id: AgentId) -> Result<Option<AgentProfile>, StoreError> {
        Ok(self.inner.lock().agents.get(&id.0).cloned())
    }

    async fn ancestors(
        &self,
        id: AgentId,
        max_depth: usize,
    ) -> Result<Vec<AgentProfile>, StoreError> {
        let inner = self.inner.lock();
        let mut chain = Vec::new();
        let mut seen: HashSet<AgentId> = HashSet::new();
        let mut cursor = inner.agents.get(&id.0).and_then(|a| a.sponsor);
        while let Some(next_id) = cursor {
            if chain.len() >= max_depth || !seen.insert(next_id) {
                break;
            }
            let Some(node) = inner.agents.get(&next_id.0) else {
                break;
            };
            chain.push(node.clone());
            cursor = node.sponsor;
        }
        Ok(chain)
    }

    async fn direct_descendants(&self, id: AgentId) -> Result<Vec<AgentProfile>, StoreError> {
        Ok(self
            .inner
            .lock()
            .agents
            .values()
            .filter(|a| a.sponsor == Some(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LifecycleStore for MemoryBackend {
    async fn get(&self, agent: AgentId) -> Result<Option<LifecycleRecord>, StoreError> {
        Ok(self.inner.lock().lifecycle.get(&agent.0).cloned())
    }

    async fn due_for_review(&self, day: NaiveDate) -> Result<Vec<LifecycleRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .lifecycle
            .values()
            .filter(|r| r.review_deadline_at.date_naive() == day)
            .cloned()
            .collect())
    }

    async fn transitioned_on(
        &self,
        day: NaiveDate,
        status: LifecycleStatus,
    ) -> Result<Vec<LifecycleRecord>, StoreError> {
        let inner = self.inner.lock();
        let rows = inner
            .lifecycle
            .values()
            .filter(|r| r.status == status)
            .filter(|r| match status {
                LifecycleStatus::Upgraded => r.upgrade_granted_at.date_naive() == day,
                LifecycleStatus::Downgraded => {
                    r.downgraded_at.map(|t| t.date_naive()) == Some(day)
                }
                _ => r.last_checked_at.map(|t| t.date_naive()) == Some(day),
            })
            .cloned()
            .collect();
        Ok(rows)
    }
}

#[async_trait]
impl HistoryStore for MemoryBackend {
    async fn find_on_day(
        &self,
        agent: AgentId,
        day: NaiveDate,
    ) -> Result<Option<PromotionRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .history
            .iter()
            .rev()
            .find(|h| h.agent_id == agent && h.created_at.date_naive() == day)
            .cloned())
    }
}

#[async_trait]
impl TierLedger for MemoryBackend {
    async fn commit_promotion(&self, commit: PromotionCommit) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let agent_id = commit.history.agent_id;
        Self::check_fail(&inner, agent_id)?;

        let duplicate = inner.history.iter().any(|h| {
            h.agent_id == agent_id
                && h.month_key() == commit.history.month_key()
                && h.to_tier == commit.history.to_tier
        });
        if duplicate {
            return Ok(false);
        }

        if let Some(agent) = inner.agents.get_mut(&agent_id.0) {
            agent.tier = commit.lifecycle.current_tier;
        }
        inner.history.push(commit.history);
        inner.lifecycle.insert(agent_id.0, commit.lifecycle);
        Ok(true)
    }

    async fn commit_retention(&self, record: LifecycleRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::check_fail(&inner, record.agent_id)?;
        inner.lifecycle.insert(record.agent_id.0, record);
        Ok(())
    }

    async fn commit_demotion(&self, commit: DemotionCommit) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let agent_id = commit.lifecycle.agent_id;
        Self::check_fail(&inner, agent_id)?;
        if let Some(agent) = inner.agents.get_mut(&agent_id.0) {
            agent.tier = commit.lifecycle.current_tier;
        }
        inner.lifecycle.insert(agent_id.0, commit.lifecycle);
        Ok(())
    }

    async fn commit_reparent(&self, commit: ReparentCommit) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::check_fail(&inner, commit.agent_id)?;
        if let Some(agent) = inner.agents.get_mut(&commit.agent_id.0) {
            agent.sponsor = Some(commit.new_sponsor);
        }
        if let Some(patch) = commit.history {
            apply_history_patch(&mut inner, &patch);
        }
        if let Some(entry) = commit.audit {
            inner.audit.push(entry);
        }
        Ok(())
    }

    async fn record_repair_outcome(&self, outcome: ReparentOutcome) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        apply_history_patch(&mut inner, &outcome);
        Ok(())
    }
}

fn apply_history_patch(inner: &mut Inner, patch: &ReparentOutcome) {
    if let Some(entry) = inner.history.iter_mut().find(|h| h.id == patch.record_id) {
        entry.change_parent = Some(patch.change_parent.clone());
        entry.sponsor_change = Some(patch.sponsor_change);
        entry.new_sponsor_id = patch.new_sponsor.as_ref().map(|s| s.id);
        entry.new_sponsor = patch.new_sponsor.clone();
    }
}

/// Notifier that records every notice it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent dispatch fail.
    pub fn fail_all(&self) {
        *self.fail.lock() = true;
    }

    pub fn sent(&self) -> Vec<Notice> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, notice: Notice) -> Result<(), StoreError> {
        if *self.fail.lock() {
            return Err(StoreError::Unavailable("notifier down".to_string()));
        }
        self.sent.lock().push(notice);
        Ok(())
    }
}
