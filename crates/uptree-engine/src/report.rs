//! Run reports
//!
//! Every entry point returns one of these to the scheduler. Individual agent
//! failures are data, not errors: the batch keeps going and the report says
//! what happened.

use serde::{Deserialize, Serialize};
use uptree_core::AgentId;

/// One agent the stage could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    /// Agent whose transaction failed or was refused
    pub agent_id: AgentId,
    /// Short reason tag
    pub reason: String,
}

/// Outcome of one batch stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Agents whose mutation committed
    pub processed: usize,
    /// Agents skipped without mutation (idempotent conflicts, unresolved repairs)
    pub skipped: usize,
    /// Agents whose processing failed
    pub failed: Vec<AgentFailure>,
}

impl RunReport {
    /// Empty report.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one committed agent.
    #[inline]
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    /// Count one skipped agent.
    #[inline]
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Record one failed agent.
    pub fn record_failure(&mut self, agent_id: AgentId, reason: impl Into<String>) {
        self.failed.push(AgentFailure {
            agent_id,
            reason: reason.into(),
        });
    }

    /// Whether the stage finished without per-agent failures.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reports of the four stages of one daily run, in execution order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySummary {
    /// Threshold scan + promotion processing
    pub promotion: RunReport,
    /// Retention review
    pub review: RunReport,
    /// Tree repair
    pub repair: RunReport,
    /// Notification dispatch
    pub notify: RunReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_outcomes() {
        let mut report = RunReport::new();
        report.record_processed();
        report.record_processed();
        report.record_skipped();
        report.record_failure(AgentId(9), "store: connection reset");

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_clean());
    }
}
