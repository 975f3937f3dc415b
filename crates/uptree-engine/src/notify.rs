//! Notification driver
//!
//! Once per day, turns the day's tier transitions into outbound notices: one
//! per channel per agent, email only when an address is on file. Dispatch is
//! fire-and-forget; a notifier failure is logged and counted, and never
//! touches tier state.

use crate::config::EngineConfig;
use crate::report::RunReport;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uptree_core::{
    format_amount, AgentProfile, DirectoryStore, EngineError, LifecycleRecord, LifecycleStatus,
    LifecycleStore, Notice, NoticeChannel, Notifier,
};

/// Emits the day's tier-transition notices.
pub struct NotificationDriver {
    lifecycle: Arc<dyn LifecycleStore>,
    directory: Arc<dyn DirectoryStore>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl NotificationDriver {
    /// Create a driver over the given stores and dispatch interface.
    #[must_use]
    pub fn new(
        lifecycle: Arc<dyn LifecycleStore>,
        directory: Arc<dyn DirectoryStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            lifecycle,
            directory,
            notifier,
            config,
        }
    }

    /// Notify every agent that transitioned today.
    ///
    /// # Errors
    /// Only a failure to read the transition sets fails the stage; per-agent
    /// problems land in the report.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport, EngineError> {
        let day = now.date_naive();
        let mut report = RunReport::new();

        let upgraded = self
            .lifecycle
            .transitioned_on(day, LifecycleStatus::Upgraded)
            .await?;
        for record in upgraded {
            self.notify_one(&record, &mut report, |agent, channel| Notice::TierUpgraded {
                channel,
                username: agent.username.clone(),
                email: agent.email.clone(),
                full_name: agent.full_name.clone(),
                tier: record.current_tier,
            })
            .await;
        }

        let downgraded = self
            .lifecycle
            .transitioned_on(day, LifecycleStatus::Downgraded)
            .await?;
        for record in downgraded {
            // After a demotion the lost rank sits in `upgrade_tier`.
            let Some(lost_tier) = record.upgrade_tier else {
                report.record_skipped();
                continue;
            };
            let bar = format_amount(self.config.retention_bar(lost_tier).unwrap_or_default());
            let from_date = record.upgrade_granted_at.date_naive();
            let to_date = record.downgraded_at.unwrap_or(now).date_naive();

            self.notify_one(&record, &mut report, |agent, channel| Notice::TierDowngraded {
                channel,
                username: agent.username.clone(),
                email: agent.email.clone(),
                full_name: agent.full_name.clone(),
                lost_tier,
                current_tier: record.current_tier,
                retention_bar: bar.clone(),
                from_date,
                to_date,
            })
            .await;
        }

        Ok(report)
    }

    /// Build and dispatch both channels for one agent.
    async fn notify_one(
        &self,
        record: &LifecycleRecord,
        report: &mut RunReport,
        build: impl Fn(&AgentProfile, NoticeChannel) -> Notice,
    ) {
        let agent = match self.directory.agent(record.agent_id).await {
            Ok(Some(agent)) => agent,
            Ok(None) => {
                report.record_failure(record.agent_id, "not_found");
                return;
            }
            Err(e) => {
                report.record_failure(record.agent_id, format!("store: {e}"));
                return;
            }
        };

        if agent.email.is_some() {
            self.dispatch(build(&agent, NoticeChannel::Email)).await;
        }
        self.dispatch(build(&agent, NoticeChannel::InApp)).await;
        report.record_processed();
    }

    /// Fire-and-forget dispatch.
    async fn dispatch(&self, notice: Notice) {
        if let Err(e) = self.notifier.dispatch(notice).await {
            tracing::warn!(error = %e, "notice dispatch failed");
        }
    }
}
