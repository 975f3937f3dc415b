//! Tree reparenting resolver
//!
//! A tier change can invalidate the referral tree's ordering invariant: a
//! sponsor must always be strictly senior to its descendant. After a
//! promotion the agent may have out-ranked its own sponsor; after a demotion
//! the agent's direct descendants may have caught up with it. Both repairs
//! resolve the nearest qualifying ancestor over a pre-fetched ancestor chain
//! (nearest in tree distance wins) and apply the edge move in one
//! transaction.
//!
//! Repairs never abort a tier change: an unresolved search is recorded (400
//! on the history entry, or a warning for descendants) and the edge is left
//! in place until a later change produces a valid candidate.

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uptree_core::{
    AgentId, AgentProfile, AuditEntry, DirectoryStore, EngineError, HistoryStore, LifecycleRecord,
    ReparentCommit, ReparentOutcome, SponsorChange, StepOutcome, Tier, TierLedger,
};

/// How one repair ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The current sponsor already satisfies the invariant; nothing moved
    AlreadyValid,
    /// The edge moved to a new sponsor
    Reassigned {
        /// Sponsor before the repair
        from: Option<AgentId>,
        /// Sponsor after the repair
        to: AgentId,
    },
    /// No qualifying ancestor in the chain; the edge was left alone
    Unresolved,
    /// Nothing to repair (no history entry, no sponsor, tree root)
    Skipped,
}

/// Repairs the referral tree after tier changes.
pub struct TreeReparenter {
    directory: Arc<dyn DirectoryStore>,
    history: Arc<dyn HistoryStore>,
    ledger: Arc<dyn TierLedger>,
    config: EngineConfig,
}

impl TreeReparenter {
    /// Create a resolver over the given stores.
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        history: Arc<dyn HistoryStore>,
        ledger: Arc<dyn TierLedger>,
        config: EngineConfig,
    ) -> Self {
        Self {
            directory,
            history,
            ledger,
            config,
        }
    }

    /// Repair the sponsor edge of an agent promoted today.
    ///
    /// Reads the day's promotion entry, walks the agent's ancestor chain
    /// outward, and either confirms the current sponsor, moves the edge to
    /// the nearest strictly-senior ancestor, or records an unresolved search
    /// on the history entry.
    pub async fn repair_promoted(
        &self,
        record: &LifecycleRecord,
        now: DateTime<Utc>,
    ) -> Result<RepairOutcome, EngineError> {
        let Some(entry) = self
            .history
            .find_on_day(record.agent_id, now.date_naive())
            .await?
        else {
            tracing::debug!(agent = %record.agent_id, "no promotion entry today, nothing to repair");
            return Ok(RepairOutcome::Skipped);
        };

        // A root agent has no sponsor; that is a legitimate terminal case.
        if entry.sponsor_id.is_none() {
            return Ok(RepairOutcome::Skipped);
        }

        let chain = self
            .directory
            .ancestors(record.agent_id, self.config.max_ancestor_depth)
            .await?;
        let current_sponsor = chain.first().map(|node| node.id);

        let Some(ancestor) = nearest_qualifying(&chain, record.current_tier, None) else {
            self.ledger
                .record_repair_outcome(ReparentOutcome {
                    record_id: entry.id,
                    change_parent: StepOutcome::refused(
                        "no ancestor senior enough to sponsor the new tier",
                    ),
                    sponsor_change: SponsorChange::Unchanged,
                    new_sponsor: None,
                })
                .await?;
            tracing::warn!(agent = %record.agent_id, tier = %record.current_tier, "sponsor repair unresolved");
            return Ok(RepairOutcome::Unresolved);
        };

        if Some(ancestor.id) == current_sponsor {
            self.ledger
                .record_repair_outcome(ReparentOutcome {
                    record_id: entry.id,
                    change_parent: StepOutcome::ok("current sponsor already qualifies"),
                    sponsor_change: SponsorChange::Unchanged,
                    new_sponsor: None,
                })
                .await?;
            return Ok(RepairOutcome::AlreadyValid);
        }

        let new_sponsor = ancestor.id;
        self.ledger
            .commit_reparent(ReparentCommit {
                agent_id: record.agent_id,
                new_sponsor,
                history: Some(ReparentOutcome {
                    record_id: entry.id,
                    change_parent: StepOutcome::ok("sponsor reassigned"),
                    sponsor_change: SponsorChange::Reassigned,
                    new_sponsor: Some(ancestor.snapshot()),
                }),
                audit: None,
            })
            .await?;

        tracing::info!(
            agent = %record.agent_id,
            to = %new_sponsor,
            "sponsor reassigned after promotion"
        );
        Ok(RepairOutcome::Reassigned {
            from: current_sponsor,
            to: new_sponsor,
        })
    }

    /// Repair the direct descendants of an agent demoted today.
    ///
    /// Descendants whose tier is now senior-or-equal to the demoted agent's
    /// are moved up past it: each gets its own nearest-qualifying-ancestor
    /// search, skipping the demoted agent itself. A descendant with no
    /// candidate keeps its edge; that is logged, never forced. One level only;
    /// deeper generations are repaired when their own sponsor demotes.
    pub async fn repair_demoted(
        &self,
        record: &LifecycleRecord,
        now: DateTime<Utc>,
    ) -> Result<Vec<(AgentId, RepairOutcome)>, EngineError> {
        let descendants = self.directory.direct_descendants(record.agent_id).await?;
        let mut outcomes = Vec::new();

        for child in descendants {
            // Still strictly junior: the edge is fine.
            if record.current_tier.is_senior_to(child.tier) {
                continue;
            }

            let chain = self
                .directory
                .ancestors(child.id, self.config.max_ancestor_depth)
                .await?;

            match nearest_qualifying(&chain, child.tier, Some(record.agent_id)) {
                Some(ancestor) => {
                    let new_sponsor = ancestor.id;
                    self.ledger
                        .commit_reparent(ReparentCommit {
                            agent_id: child.id,
                            new_sponsor,
                            history: None,
                            audit: Some(AuditEntry::sponsor_reassigned(
                                child.id,
                                child.sponsor,
                                new_sponsor,
                                now,
                            )),
                        })
                        .await?;
                    tracing::info!(
                        agent = %child.id,
                        from = %record.agent_id,
                        to = %new_sponsor,
                        "descendant moved past demoted sponsor"
                    );
                    outcomes.push((
                        child.id,
                        RepairOutcome::Reassigned {
                            from: child.sponsor,
                            to: new_sponsor,
                        },
                    ));
                }
                None => {
                    tracing::warn!(
                        agent = %child.id,
                        sponsor = %record.agent_id,
                        "no qualifying ancestor for descendant of demoted agent; edge left in place"
                    );
                    outcomes.push((child.id, RepairOutcome::Unresolved));
                }
            }
        }

        Ok(outcomes)
    }
}

/// Nearest ancestor in `chain` (ordered nearest first) whose tier may
/// sponsor `child_tier`, skipping `skip` when given.
///
/// The visited set guards against malformed edge data: a chain that revisits
/// a node terminates the walk instead of looping.
fn nearest_qualifying(
    chain: &[AgentProfile],
    child_tier: Tier,
    skip: Option<AgentId>,
) -> Option<&AgentProfile> {
    let mut visited: HashSet<AgentId> = HashSet::new();
    for node in chain {
        if !visited.insert(node.id) {
            tracing::warn!(agent = %node.id, "ancestor chain revisits a node, stopping walk");
            return None;
        }
        if skip == Some(node.id) {
            continue;
        }
        if node.tier.can_sponsor(child_tier) {
            return Some(node);
        }
    }
    None
}
