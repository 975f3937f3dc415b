//! Threshold scanner
//!
//! Finds promotion candidates: for each configured pass, sum every agent's
//! trailing-window group revenue and keep those at or over the bar. Passes
//! run most-junior tier first, and an agent selected by an earlier pass is
//! never selected again in the same run: the pass that follows a promotion
//! would otherwise see the agent at its new tier and promote it twice.
//!
//! Scanning is a pure read; candidates carry everything the promotion
//! processor needs.

use crate::config::{EngineConfig, PromotionRule};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uptree_core::{AgentId, EngineError, RevenueStore};

/// One promotion candidate with the revenue sum that qualified it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Agent to promote
    pub agent_id: AgentId,
    /// Trailing-window group revenue (minor units)
    pub qualifying_revenue: i64,
}

/// Identifies promotion candidates per tier.
pub struct ThresholdScanner {
    revenue: Arc<dyn RevenueStore>,
    config: EngineConfig,
}

impl ThresholdScanner {
    /// Create a scanner over the given revenue source.
    #[must_use]
    pub fn new(revenue: Arc<dyn RevenueStore>, config: EngineConfig) -> Self {
        Self { revenue, config }
    }

    /// Run a single pass, excluding agents already selected this run.
    ///
    /// # Errors
    /// A failed revenue query fails the pass; there is no partial result.
    pub async fn scan_pass(
        &self,
        rule: &PromotionRule,
        now: DateTime<Utc>,
        exclude: &HashSet<AgentId>,
    ) -> Result<Vec<Candidate>, EngineError> {
        let since = now - Duration::days(rule.window_days);
        let rows = self
            .revenue
            .agents_at_or_over(rule.tier, rule.agency, since, rule.bar)
            .await?;

        let candidates: Vec<Candidate> = rows
            .into_iter()
            .filter(|(id, _)| !exclude.contains(id))
            .map(|(agent_id, qualifying_revenue)| Candidate {
                agent_id,
                qualifying_revenue,
            })
            .collect();

        tracing::debug!(
            tier = %rule.tier,
            window_days = rule.window_days,
            candidates = candidates.len(),
            "threshold pass scanned"
        );
        Ok(candidates)
    }

    /// Run all passes without side effects, preserving pass order.
    ///
    /// Used for dry runs and reporting; the engine itself scans pass by pass
    /// so promotions commit before the next tier is read.
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<Vec<Candidate>, EngineError> {
        let mut selected: HashSet<AgentId> = HashSet::new();
        let mut out = Vec::new();
        for rule in &self.config.promotion_passes {
            let pass = self.scan_pass(rule, now, &selected).await?;
            for candidate in pass {
                if selected.insert(candidate.agent_id) {
                    out.push(candidate);
                }
            }
        }
        Ok(out)
    }
}
