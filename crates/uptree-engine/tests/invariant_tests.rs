//! Property tests: the referral tree's ordering invariant and acyclicity
//! hold after a full daily run over arbitrary valid trees.
//!
//! Trees are built so every chain tops out at a national-director root,
//! which means every repair search has a qualifying ancestor, so the
//! ordering invariant must hold universally once the run finishes.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uptree_core::{AgentId, AgentProfile, LifecycleRecord, Tier};
use uptree_engine::{EngineConfig, LifecycleEngine};
use uptree_test_utils::{profile, MemoryBackend, RecordingNotifier};

fn run_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 12, 0, 30, 0).unwrap()
}

fn tier_from(choice: u8) -> Tier {
    match choice % 4 {
        0 => Tier::SalesAgent,
        1 => Tier::SalesManager,
        2 => Tier::Casa,
        _ => Tier::SalesDirector,
    }
}

/// Build a valid tree: each agent sponsors under the nearest earlier agent
/// that out-ranks it, falling back to the root.
fn build_tree(backend: &MemoryBackend, specs: &[(u8, i64, i64, bool)]) {
    let now = run_day();
    backend.upsert_agent(profile(1, Tier::National));
    let mut placed: Vec<(u64, Tier)> = vec![(1, Tier::National)];

    for (i, (choice, revenue, day_offset, under_review)) in specs.iter().enumerate() {
        let id = i as u64 + 2;
        let tier = tier_from(*choice);
        let sponsor = placed
            .iter()
            .rev()
            .find(|(_, t)| t.is_senior_to(tier))
            .map(|(sid, _)| *sid)
            .unwrap_or(1);

        let mut agent = profile(id, tier);
        agent.sponsor = Some(AgentId(sponsor));
        backend.upsert_agent(agent);
        placed.push((id, tier));

        backend.add_revenue(
            AgentId(id),
            (now - Duration::days(*day_offset)).date_naive(),
            *revenue,
        );
        if *under_review && tier != Tier::SalesAgent {
            backend.insert_lifecycle(LifecycleRecord::on_promotion(
                AgentId(id),
                tier,
                now - Duration::days(90),
                Duration::days(90),
            ));
        }
    }
}

fn check_invariants(agents: &[AgentProfile]) -> Result<(), TestCaseError> {
    let by_id: HashMap<u64, &AgentProfile> = agents.iter().map(|a| (a.id.0, a)).collect();

    for agent in agents {
        // Ordering: every sponsor strictly out-ranks its descendant.
        if let Some(sponsor_id) = agent.sponsor {
            let sponsor = by_id
                .get(&sponsor_id.0)
                .ok_or_else(|| TestCaseError::fail(format!("dangling sponsor {sponsor_id}")))?;
            prop_assert!(
                sponsor.tier.is_senior_to(agent.tier),
                "agent {} at {:?} sponsored by {} at {:?}",
                agent.id,
                agent.tier,
                sponsor.id,
                sponsor.tier
            );
        }

        // Acyclicity: walking up from any agent terminates.
        let mut seen: HashSet<AgentId> = HashSet::new();
        let mut cursor = agent.sponsor;
        while let Some(next) = cursor {
            prop_assert!(seen.insert(next), "sponsor cycle through {next}");
            cursor = by_id.get(&next.0).and_then(|a| a.sponsor);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn daily_run_preserves_tree_invariants(
        specs in prop::collection::vec(
            (0u8..4, 0i64..2_000_000_000, 0i64..200, any::<bool>()),
            1..10,
        )
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let backend = Arc::new(MemoryBackend::new());
            build_tree(&backend, &specs);
            check_invariants(&backend.all_agents())?;

            let engine = LifecycleEngine::new(
                backend.clone(),
                backend.clone(),
                backend.clone(),
                backend.clone(),
                backend.clone(),
                Arc::new(RecordingNotifier::new()),
                EngineConfig::default(),
            );
            engine
                .run_daily(run_day())
                .await
                .map_err(|e| TestCaseError::fail(format!("daily run failed: {e}")))?;

            check_invariants(&backend.all_agents())
        })?;
    }

    #[test]
    fn two_consecutive_days_stay_consistent(
        specs in prop::collection::vec(
            (0u8..4, 0i64..2_000_000_000, 0i64..200, any::<bool>()),
            1..8,
        )
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let backend = Arc::new(MemoryBackend::new());
            build_tree(&backend, &specs);

            let engine = LifecycleEngine::new(
                backend.clone(),
                backend.clone(),
                backend.clone(),
                backend.clone(),
                backend.clone(),
                Arc::new(RecordingNotifier::new()),
                EngineConfig::default(),
            );
            for day in 0..2 {
                engine
                    .run_daily(run_day() + Duration::days(day))
                    .await
                    .map_err(|e| TestCaseError::fail(format!("daily run failed: {e}")))?;
                check_invariants(&backend.all_agents())?;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
