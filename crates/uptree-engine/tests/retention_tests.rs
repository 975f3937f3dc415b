//! Retention review tests: renewal, demotion, indefinite retention, isolation.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use uptree_core::{AgentId, LifecycleRecord, LifecycleStatus, Tier};
use uptree_engine::{EngineConfig, LifecycleEngine};
use uptree_test_utils::{profile, MemoryBackend, RecordingNotifier};

fn granted_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 1, 30, 0).unwrap()
}

/// 90 days after the grant, so the seeded records are due.
fn review_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 30, 1, 30, 0).unwrap()
}

fn engine(backend: &Arc<MemoryBackend>) -> LifecycleEngine {
    LifecycleEngine::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        Arc::new(RecordingNotifier::new()),
        EngineConfig::default(),
    )
}

/// Seed an agent under probation at `tier`, granted on `granted_day`.
fn seed_probation(backend: &MemoryBackend, id: u64, tier: Tier) {
    backend.upsert_agent(profile(id, tier));
    backend.insert_lifecycle(LifecycleRecord::on_promotion(
        AgentId(id),
        tier,
        granted_day(),
        Duration::days(90),
    ));
}

#[tokio::test]
async fn bar_met_renews_and_retains() {
    let backend = Arc::new(MemoryBackend::new());
    seed_probation(&backend, 1, Tier::Casa);
    backend.add_revenue(AgentId(1), granted_day().date_naive() + Duration::days(10), 600_000_000);

    let report = engine(&backend).run_retention_review(review_day()).await.unwrap();

    assert_eq!(report.processed, 1);
    let record = backend.lifecycle_of(AgentId(1)).unwrap();
    assert_eq!(record.status, LifecycleStatus::Retained);
    assert_eq!(record.current_tier, Tier::Casa);
    assert_eq!(record.review_deadline_at, review_day() + Duration::days(90));
    assert_eq!(record.last_checked_at, Some(review_day()));
    assert_eq!(backend.tier_of(AgentId(1)), Some(Tier::Casa));
}

#[tokio::test]
async fn bar_missed_demotes_to_recorded_target() {
    let backend = Arc::new(MemoryBackend::new());
    seed_probation(&backend, 1, Tier::SalesDirector);
    // 400M since the grant, far under the 2B director bar.
    backend.add_revenue(AgentId(1), granted_day().date_naive() + Duration::days(10), 400_000_000);

    let report = engine(&backend).run_retention_review(review_day()).await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(backend.tier_of(AgentId(1)), Some(Tier::Casa));

    let record = backend.lifecycle_of(AgentId(1)).unwrap();
    assert_eq!(record.status, LifecycleStatus::Downgraded);
    assert_eq!(record.current_tier, Tier::Casa);
    assert_eq!(record.upgrade_tier, Some(Tier::SalesDirector));
    assert_eq!(record.downgraded_tier, Some(Tier::SalesManager));
    assert_eq!(record.downgraded_at, Some(review_day()));
    assert_eq!(record.review_deadline_at, review_day() + Duration::days(90));
}

#[tokio::test]
async fn revenue_before_grant_does_not_count() {
    let backend = Arc::new(MemoryBackend::new());
    seed_probation(&backend, 1, Tier::Casa);
    backend.add_revenue(AgentId(1), granted_day().date_naive() - Duration::days(3), 600_000_000);

    engine(&backend).run_retention_review(review_day()).await.unwrap();

    assert_eq!(
        backend.lifecycle_of(AgentId(1)).unwrap().status,
        LifecycleStatus::Downgraded
    );
}

#[tokio::test]
async fn tier_without_bar_retains_indefinitely() {
    let backend = Arc::new(MemoryBackend::new());
    seed_probation(&backend, 1, Tier::SalesManager);
    // No revenue at all; a sales manager still retains.

    let report = engine(&backend).run_retention_review(review_day()).await.unwrap();

    assert_eq!(report.processed, 1);
    let record = backend.lifecycle_of(AgentId(1)).unwrap();
    assert_eq!(record.status, LifecycleStatus::Retained);
    assert_eq!(record.current_tier, Tier::SalesManager);
    assert!(record.review_deadline_at > review_day());
    assert_eq!(backend.tier_of(AgentId(1)), Some(Tier::SalesManager));
}

#[tokio::test]
async fn records_not_due_today_are_untouched() {
    let backend = Arc::new(MemoryBackend::new());
    seed_probation(&backend, 1, Tier::Casa);

    let early = review_day() - Duration::days(7);
    let report = engine(&backend).run_retention_review(early).await.unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(
        backend.lifecycle_of(AgentId(1)).unwrap().status,
        LifecycleStatus::Upgraded
    );
}

#[tokio::test]
async fn one_failing_review_does_not_halt_the_batch() {
    let backend = Arc::new(MemoryBackend::new());
    seed_probation(&backend, 1, Tier::SalesManager);
    seed_probation(&backend, 2, Tier::SalesManager);
    backend.fail_agent(AgentId(1));

    let report = engine(&backend).run_retention_review(review_day()).await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].agent_id, AgentId(1));
    assert_eq!(
        backend.lifecycle_of(AgentId(2)).unwrap().status,
        LifecycleStatus::Retained
    );
}
