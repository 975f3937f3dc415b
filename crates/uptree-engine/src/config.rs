//! Engine configuration
//!
//! Every business constant of the daily run lives here: the scan passes with
//! their trailing windows and revenue bars, the retention bars, and the
//! probation length. Defaults carry the production values; tests override
//! them through the `with_*` builders.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uptree_core::{AgencyId, Tier};

/// CASA branch agency; two of the default scan passes are scoped to it.
pub const CASA_AGENCY: AgencyId = AgencyId(15);

/// One threshold-scan pass: which tier is scanned, over which trailing
/// window, against which bar, and inside which agency scope if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRule {
    /// Tier whose agents this pass evaluates
    pub tier: Tier,
    /// Trailing window length in days
    pub window_days: i64,
    /// Revenue bar in minor units (sum must meet or exceed)
    pub bar: i64,
    /// Restrict the pass to one agency branch
    pub agency: Option<AgencyId>,
}

/// Revenue bar an agent must hold during probation to keep a tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionRule {
    /// Tier under probation
    pub tier: Tier,
    /// Revenue bar in minor units, summed since the promotion grant
    pub bar: i64,
}

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Probation window length in days
    pub probation_days: i64,
    /// Scan passes in execution order, most junior tier first
    pub promotion_passes: Vec<PromotionRule>,
    /// Retention bars; a tier without a rule retains indefinitely
    pub retention_rules: Vec<RetentionRule>,
    /// Upper bound on ancestor-chain loads (cycle/garbage guard)
    pub max_ancestor_depth: usize,
}

impl EngineConfig {
    /// Default configuration with the production constants.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a probation window override.
    #[inline]
    #[must_use]
    pub fn with_probation_days(mut self, days: i64) -> Self {
        self.probation_days = days;
        self
    }

    /// With a custom set of scan passes.
    #[inline]
    #[must_use]
    pub fn with_promotion_passes(mut self, passes: Vec<PromotionRule>) -> Self {
        self.promotion_passes = passes;
        self
    }

    /// With a custom set of retention bars.
    #[inline]
    #[must_use]
    pub fn with_retention_rules(mut self, rules: Vec<RetentionRule>) -> Self {
        self.retention_rules = rules;
        self
    }

    /// Probation window as a duration.
    #[inline]
    #[must_use]
    pub fn probation(&self) -> Duration {
        Duration::days(self.probation_days)
    }

    /// Retention bar for a tier, `None` when the tier retains indefinitely.
    #[must_use]
    pub fn retention_bar(&self, tier: Tier) -> Option<i64> {
        self.retention_rules
            .iter()
            .find(|rule| rule.tier == tier)
            .map(|rule| rule.bar)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probation_days: 90,
            promotion_passes: vec![
                PromotionRule {
                    tier: Tier::SalesAgent,
                    window_days: 30,
                    bar: 20_000_000,
                    agency: None,
                },
                PromotionRule {
                    tier: Tier::SalesManager,
                    window_days: 180,
                    bar: 1_200_000_000,
                    agency: Some(CASA_AGENCY),
                },
                PromotionRule {
                    tier: Tier::Casa,
                    window_days: 360,
                    bar: 10_200_000_000,
                    agency: Some(CASA_AGENCY),
                },
            ],
            retention_rules: vec![
                RetentionRule {
                    tier: Tier::SalesDirector,
                    bar: 2_000_000_000,
                },
                RetentionRule {
                    tier: Tier::Casa,
                    bar: 500_000_000,
                },
            ],
            max_ancestor_depth: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_passes_cover_the_ladder_bottom_up() {
        let config = EngineConfig::default();
        let tiers: Vec<Tier> = config.promotion_passes.iter().map(|p| p.tier).collect();
        assert_eq!(tiers, vec![Tier::SalesAgent, Tier::SalesManager, Tier::Casa]);

        // Every scanned tier has a promotion target on the fixed ladder.
        for pass in &config.promotion_passes {
            assert!(pass.tier.next_senior().is_some());
        }
    }

    #[test]
    fn sales_manager_has_no_retention_bar() {
        let config = EngineConfig::default();
        assert_eq!(config.retention_bar(Tier::SalesDirector), Some(2_000_000_000));
        assert_eq!(config.retention_bar(Tier::Casa), Some(500_000_000));
        assert_eq!(config.retention_bar(Tier::SalesManager), None);
    }

    #[test]
    fn builders_override_defaults() {
        let config = EngineConfig::new().with_probation_days(30);
        assert_eq!(config.probation(), Duration::days(30));
    }
}
