//! Error taxonomy
//!
//! Per-agent outcomes that terminate one agent's processing without touching
//! the rest of the batch. Only a failure to read an entire candidate set
//! escalates past the per-agent boundary.

use crate::agent::AgentId;
use crate::stores::StoreError;
use crate::tier::Tier;
use thiserror::Error;

/// Engine-level failure for one agent's processing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Agent row missing or inactive
    #[error("agent {0} not found or inactive")]
    NotFound(AgentId),

    /// The fixed ladder has no rank above the agent's current one
    #[error("no promotion path above {0}")]
    UnsupportedTransition(Tier),

    /// Idempotency guard: this month already holds an equivalent promotion
    #[error("agent {agent} already promoted to {tier} this month")]
    Conflict {
        /// Agent that already promoted
        agent: AgentId,
        /// Target tier of the existing entry
        tier: Tier,
    },

    /// Storage call failed; the agent's transaction rolled back in full
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Short reason tag recorded in run reports.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            EngineError::NotFound(_) => "not_found".to_string(),
            EngineError::UnsupportedTransition(_) => "unsupported_transition".to_string(),
            EngineError::Conflict { .. } => "conflict".to_string(),
            EngineError::Store(e) => format!("store: {e}"),
        }
    }

    /// Whether this outcome is an idempotent skip rather than a failure.
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict { .. })
    }
}
