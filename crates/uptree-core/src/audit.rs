//! Audit log
//!
//! Append-only record of automated sponsor reassignments. Demotion repair
//! rewires descendants without any human in the loop, so every rewire is
//! logged under a system operator identity with the before/after edge.

use crate::agent::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity an automated change is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// Operator account name
    pub name: String,
    /// Role code of the account
    pub role: String,
}

impl Operator {
    /// The engine's own service identity.
    #[must_use]
    pub fn system() -> Self {
        Self {
            name: "lifecycle-engine".to_string(),
            role: "SYSTEM".to_string(),
        }
    }
}

/// One automated sponsor reassignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier
    pub id: Uuid,
    /// Who performed the change
    pub operator: Operator,
    /// Agent whose edge moved
    pub agent_id: AgentId,
    /// Short action tag, e.g. `downgrade_change_parent`
    pub action: String,
    /// Sponsor before the change
    pub old_sponsor: Option<AgentId>,
    /// Sponsor after the change
    pub new_sponsor: AgentId,
    /// When the change was applied
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Entry for a descendant rewired away from a demoted sponsor.
    #[must_use]
    pub fn sponsor_reassigned(
        agent_id: AgentId,
        old_sponsor: Option<AgentId>,
        new_sponsor: AgentId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            operator: Operator::system(),
            agent_id,
            action: "downgrade_change_parent".to_string(),
            old_sponsor,
            new_sponsor,
            recorded_at: now,
        }
    }
}
