//! Agent directory records
//!
//! An agent is a member of the sales network: one rank, one agency scope,
//! at most one sponsor above it in the referral tree.
//!
//! All money values are i64 minor units.

use crate::tier::Tier;
use serde::{Deserialize, Serialize};

/// Unique agent identifier (directory primary key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Agency scope identifier.
///
/// Some promotion passes only apply inside a single agency branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgencyId(pub u32);

impl std::fmt::Display for AgencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directory row for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Agent identifier
    pub id: AgentId,
    /// Login name
    pub username: String,
    /// Display name
    pub full_name: String,
    /// Contact address for email notices, if any
    pub email: Option<String>,
    /// Current rank
    pub tier: Tier,
    /// Agency branch the agent belongs to
    pub agency: AgencyId,
    /// Direct upward sponsor in the referral tree
    pub sponsor: Option<AgentId>,
    /// Whether the agent is active (inactive agents are never promoted)
    pub active: bool,
}

impl AgentProfile {
    /// Whether `candidate` would be a valid sponsor for this agent.
    #[inline]
    #[must_use]
    pub fn accepts_sponsor(&self, candidate: Tier) -> bool {
        candidate.can_sponsor(self.tier)
    }

    /// Freeze the fields that promotion history keeps.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            tier: self.tier,
            agency: self.agency,
        }
    }
}

/// The frozen subset of an agent row persisted inside history entries.
///
/// History is append-only; snapshots keep what the agent looked like at the
/// moment of the event even after the live row moves on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent identifier
    pub id: AgentId,
    /// Login name at event time
    pub username: String,
    /// Display name at event time
    pub full_name: String,
    /// Rank at event time
    pub tier: Tier,
    /// Agency branch at event time
    pub agency: AgencyId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(tier: Tier) -> AgentProfile {
        AgentProfile {
            id: AgentId(11),
            username: "ngo.tan".to_string(),
            full_name: "Ngo Van Tan".to_string(),
            email: None,
            tier,
            agency: AgencyId(15),
            sponsor: None,
            active: true,
        }
    }

    #[test]
    fn sponsor_must_outrank_agent() {
        let agent = profile(Tier::SalesManager);
        assert!(agent.accepts_sponsor(Tier::Casa));
        assert!(agent.accepts_sponsor(Tier::National));
        assert!(!agent.accepts_sponsor(Tier::SalesManager));
        assert!(!agent.accepts_sponsor(Tier::SalesAgent));
    }

    #[test]
    fn snapshot_freezes_rank() {
        let mut agent = profile(Tier::SalesAgent);
        let snap = agent.snapshot();
        agent.tier = Tier::SalesManager;
        assert_eq!(snap.tier, Tier::SalesAgent);
        assert_eq!(snap.id, agent.id);
    }
}
