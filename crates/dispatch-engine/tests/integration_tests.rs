//! Integration tests for the dispatch engine
//!
//! These tests drive the engine through its public surface: rule
//! administration, break management, and dispatch, including the
//! concurrency guarantees around rotation cursors and break transitions.

use anyhow::Result;
use futures::future::join_all;
use leadroute_dispatch_engine::prelude::*;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::collections::HashMap;
use std::sync::Arc;

async fn create_test_engine(agents: &[&str]) -> Result<Arc<DispatchEngine>> {
    let mut config = EngineConfig::default();
    config.events.broadcast_capacity = 64;

    let engine = DispatchEngine::new(config).await?;
    for id in agents {
        engine
            .register_agent(Agent::new(*id, format!("Agent {}", id)))
            .await?;
    }
    Ok(engine)
}

fn website_rule(id: &str, priority: i32, agents: &[&str]) -> Rule {
    Rule::new(
        id,
        format!("Website rule {}", id),
        priority,
        RuleCriteria::new().with_values(Dimension::Source, ["Website"]),
        agents.iter().map(|a| AgentId::from(*a)).collect(),
    )
}

fn catch_all_rule(id: &str, priority: i32, agents: &[&str]) -> Rule {
    Rule::new(
        id,
        format!("Catch all {}", id),
        priority,
        RuleCriteria::new(),
        agents.iter().map(|a| AgentId::from(*a)).collect(),
    )
}

fn website_lead(reference: &str) -> Lead {
    Lead::new(reference).with_value(Dimension::Source, "Website")
}

async fn assigned_agent(engine: &DispatchEngine, lead: Lead) -> Result<AgentId> {
    match engine.dispatch(lead).await? {
        DispatchOutcome::Assigned(record) => Ok(record.agent_id),
        other => anyhow::bail!("expected assignment, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_engine_creation() {
    let engine = create_test_engine(&["a1", "a2"])
        .await
        .expect("Engine creation failed");
    let stats = engine.stats().await.expect("Stats should be readable");

    assert_eq!(stats.agents_tracked, 2);
    assert_eq!(stats.agents_available, 2);
    assert_eq!(stats.agents_on_break, 0);
    assert_eq!(stats.total_rules, 0);
    assert_eq!(stats.dispatch.dispatched, 0);

    let config = engine.config();
    assert!(config.general.max_agents > 0);
    assert!(config.general.max_rules > 0);
}

#[tokio::test]
#[serial]
async fn test_round_robin_rotation_sequence() {
    let engine = create_test_engine(&["a", "b", "c"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(catch_all_rule("all", 1, &["a", "b", "c"]))
        .await
        .expect("Rule upsert failed");

    let mut picks = Vec::new();
    for n in 0..6 {
        let agent = assigned_agent(&engine, Lead::new(format!("lead-{}", n)))
            .await
            .expect("Dispatch failed");
        picks.push(agent.0);
    }

    assert_eq!(picks, ["a", "b", "c", "a", "b", "c"]);
}

#[tokio::test]
#[serial]
async fn test_website_source_scenario() {
    let engine = create_test_engine(&["a", "b"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(website_rule("web", 1, &["a", "b"]))
        .await
        .expect("Rule upsert failed");

    // A on the first call, B on the second, A on the third.
    for expected in ["a", "b", "a"] {
        let agent = assigned_agent(&engine, website_lead("lead"))
            .await
            .expect("Dispatch failed");
        assert_eq!(agent, expected.into());
    }

    // A lead from another source matches nothing.
    let outcome = engine
        .dispatch(Lead::new("walk-in").with_value(Dimension::Source, "Walk-in"))
        .await
        .expect("Dispatch failed");
    assert_eq!(outcome, DispatchOutcome::NoMatch);
}

#[tokio::test]
#[serial]
async fn test_on_break_agent_is_skipped_and_reenters() {
    let engine = create_test_engine(&["a", "b", "c"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(catch_all_rule("all", 1, &["a", "b", "c"]))
        .await
        .expect("Rule upsert failed");

    let a1 = assigned_agent(&engine, Lead::new("l1")).await.expect("Dispatch failed");
    assert_eq!(a1, "a".into());

    engine
        .start_break(&"b".into(), BreakType::Lunch)
        .await
        .expect("Break start failed");

    // B's turn is skipped, the cursor advances past the winner C.
    let a2 = assigned_agent(&engine, Lead::new("l2")).await.expect("Dispatch failed");
    assert_eq!(a2, "c".into());
    let a3 = assigned_agent(&engine, Lead::new("l3")).await.expect("Dispatch failed");
    assert_eq!(a3, "a".into());

    // Once back, B gets its next turn.
    engine.end_break(&"b".into()).await.expect("Break end failed");
    let a4 = assigned_agent(&engine, Lead::new("l4")).await.expect("Dispatch failed");
    assert_eq!(a4, "b".into());
}

#[tokio::test]
#[serial]
async fn test_all_busy_leaves_cursor_unchanged() {
    let engine = create_test_engine(&["a", "b"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(catch_all_rule("all", 1, &["a", "b"]))
        .await
        .expect("Rule upsert failed");

    engine
        .start_break(&"a".into(), BreakType::Tea)
        .await
        .expect("Break start failed");
    engine
        .start_break(&"b".into(), BreakType::Tea)
        .await
        .expect("Break start failed");

    let outcome = engine.dispatch(Lead::new("l1")).await.expect("Dispatch failed");
    assert_eq!(
        outcome,
        DispatchOutcome::AllBusy {
            rule_id: "all".into()
        }
    );

    let rule = engine
        .get_rule(&"all".into())
        .await
        .expect("Rule fetch failed")
        .expect("Rule should exist");
    assert_eq!(rule.cursor(), 0);

    let stats = engine.stats().await.expect("Stats should be readable");
    assert_eq!(stats.dispatch.all_busy, 1);
    assert_eq!(stats.dispatch.assigned, 0);

    // Nobody was used, so A is still first in line after the breaks end.
    engine.end_break(&"a".into()).await.expect("Break end failed");
    engine.end_break(&"b".into()).await.expect("Break end failed");
    let agent = assigned_agent(&engine, Lead::new("l2")).await.expect("Dispatch failed");
    assert_eq!(agent, "a".into());
}

#[tokio::test]
#[serial]
async fn test_break_transition_errors() {
    let engine = create_test_engine(&["a"])
        .await
        .expect("Engine creation failed");

    let err = engine
        .end_break(&"a".into())
        .await
        .expect_err("End before start should fail");
    assert!(matches!(err, DispatchError::NotOnBreak(_)));

    engine
        .start_break(&"a".into(), BreakType::Meeting)
        .await
        .expect("Break start failed");
    let err = engine
        .start_break(&"a".into(), BreakType::Tea)
        .await
        .expect_err("Second start should fail");
    assert!(matches!(err, DispatchError::AlreadyOnBreak(_)));

    let err = engine
        .start_break(&"ghost".into(), BreakType::Tea)
        .await
        .expect_err("Unknown agent should fail");
    assert!(matches!(err, DispatchError::NotFound(_)));
}

#[tokio::test]
#[serial]
async fn test_concurrent_break_transitions_are_exclusive() {
    let engine = create_test_engine(&["a"])
        .await
        .expect("Engine creation failed");

    let agent: AgentId = "a".into();
    let first = engine.start_break(&agent, BreakType::Lunch);
    let second = engine.start_break(&agent, BreakType::Tea);
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
    assert_eq!(engine.availability(&agent), Some(Availability::OnBreak));
}

#[tokio::test]
#[serial]
async fn test_toggle_preserves_rotation_state() {
    let engine = create_test_engine(&["a", "b"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(catch_all_rule("all", 1, &["a", "b"]))
        .await
        .expect("Rule upsert failed");

    let agent = assigned_agent(&engine, Lead::new("l1")).await.expect("Dispatch failed");
    assert_eq!(agent, "a".into());

    let active = engine.toggle_rule(&"all".into()).await.expect("Toggle failed");
    assert!(!active);
    let outcome = engine.dispatch(Lead::new("l2")).await.expect("Dispatch failed");
    assert_eq!(outcome, DispatchOutcome::NoMatch);

    // Reactivation resumes where the rotation left off.
    let active = engine.toggle_rule(&"all".into()).await.expect("Toggle failed");
    assert!(active);
    let rule = engine
        .get_rule(&"all".into())
        .await
        .expect("Rule fetch failed")
        .expect("Rule should exist");
    assert_eq!(rule.cursor(), 1);
    assert_eq!(rule.agents.len(), 2);

    let agent = assigned_agent(&engine, Lead::new("l3")).await.expect("Dispatch failed");
    assert_eq!(agent, "b".into());
}

#[tokio::test]
#[serial]
async fn test_lower_priority_wins_regardless_of_creation_order() {
    let engine = create_test_engine(&["general", "specialist"])
        .await
        .expect("Engine creation failed");

    // The broad rule is created first but carries a higher priority value.
    engine
        .upsert_rule(catch_all_rule("broad", 10, &["general"]))
        .await
        .expect("Rule upsert failed");
    engine
        .upsert_rule(website_rule("narrow", 1, &["specialist"]))
        .await
        .expect("Rule upsert failed");

    let agent = assigned_agent(&engine, website_lead("l1")).await.expect("Dispatch failed");
    assert_eq!(agent, "specialist".into());

    // Ties fall back to creation order.
    engine
        .upsert_rule(website_rule("narrow-later", 1, &["general"]))
        .await
        .expect("Rule upsert failed");
    let agent = assigned_agent(&engine, website_lead("l2")).await.expect("Dispatch failed");
    assert_eq!(agent, "specialist".into());
}

#[tokio::test]
#[serial]
async fn test_wildcard_rule_matches_everything() {
    let engine = create_test_engine(&["a"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(catch_all_rule("all", 1, &["a"]))
        .await
        .expect("Rule upsert failed");

    let bare = assigned_agent(&engine, Lead::new("bare")).await.expect("Dispatch failed");
    assert_eq!(bare, "a".into());

    let rich_lead = Lead::new("rich")
        .with_value(Dimension::University, "NU")
        .with_value(Dimension::Stream, "Engineering")
        .with_value(Dimension::CourseName, "B.Tech CSE")
        .with_value(Dimension::Source, "Referral");
    let rich = assigned_agent(&engine, rich_lead).await.expect("Dispatch failed");
    assert_eq!(rich, "a".into());
}

#[tokio::test]
#[serial]
async fn test_deleted_rule_stops_matching() {
    let engine = create_test_engine(&["a"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(catch_all_rule("all", 1, &["a"]))
        .await
        .expect("Rule upsert failed");

    assigned_agent(&engine, Lead::new("l1")).await.expect("Dispatch failed");
    engine.delete_rule(&"all".into()).await.expect("Delete failed");

    let outcome = engine.dispatch(Lead::new("l2")).await.expect("Dispatch failed");
    assert_eq!(outcome, DispatchOutcome::NoMatch);
    assert!(engine
        .get_rule(&"all".into())
        .await
        .expect("Rule fetch failed")
        .is_none());
}

#[tokio::test]
#[serial]
async fn test_concurrent_dispatch_fairness() {
    let engine = create_test_engine(&["a", "b", "c"])
        .await
        .expect("Engine creation failed");
    engine
        .upsert_rule(catch_all_rule("all", 1, &["a", "b", "c"]))
        .await
        .expect("Rule upsert failed");

    let mut tasks = Vec::new();
    for n in 0..30 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.dispatch(Lead::new(format!("lead-{}", n))).await
        }));
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for result in join_all(tasks).await {
        let outcome = result
            .expect("Task panicked")
            .expect("Dispatch failed");
        let record = outcome.assignment().expect("Should be assigned").clone();
        *counts.entry(record.agent_id.0).or_insert(0) += 1;
    }

    // 30 dispatches over 3 agents: exactly 10 each.
    assert_eq!(counts.len(), 3);
    for (_, count) in counts {
        assert_eq!(count, 10);
    }

    let stats = engine.stats().await.expect("Stats should be readable");
    assert_eq!(stats.dispatch.assigned, 30);
}

#[tokio::test]
#[serial]
async fn test_availability_events_and_snapshot_reread() {
    let engine = create_test_engine(&["a", "b"])
        .await
        .expect("Engine creation failed");

    let mut feed = engine.subscribe();
    engine
        .start_break(&"a".into(), BreakType::Lunch)
        .await
        .expect("Break start failed");
    engine.end_break(&"a".into()).await.expect("Break end failed");

    let started = feed.recv().await.expect("Start event missing");
    assert_eq!(started.agent_id, "a".into());
    assert_eq!(started.availability, Availability::OnBreak);
    assert_eq!(started.break_type, Some(BreakType::Lunch));

    let ended = feed.recv().await.expect("End event missing");
    assert_eq!(ended.availability, Availability::Available);
    assert_eq!(ended.break_type, None);

    // An observer that missed everything reconciles from the snapshot.
    engine
        .start_break(&"b".into(), BreakType::Training)
        .await
        .expect("Break start failed");
    let summary = engine.availability_snapshot();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.available, 1);
    assert_eq!(summary.on_break, 1);
    assert_eq!(summary.agents[1].agent_id, "b".into());
    assert_eq!(summary.agents[1].break_type, Some(BreakType::Training));
}

#[tokio::test]
#[serial]
async fn test_admin_break_and_dispatch_facades_share_state() {
    let engine = create_test_engine(&[])
        .await
        .expect("Engine creation failed");
    let admin = AdminApi::new(engine.clone());
    let breaks = BreakApi::new(engine.clone());
    let client = DispatchClient::new(engine.clone());

    admin
        .add_agent(Agent::new("a1", "Asha").with_role(RoleLevel::L2))
        .await
        .expect("Agent add failed");
    admin
        .add_agent(Agent::new("a2", "Ravi"))
        .await
        .expect("Agent add failed");
    admin
        .upsert_rule(catch_all_rule("all", 1, &["a1", "a2"]))
        .await
        .expect("Rule upsert failed");

    assert_eq!(admin.agents_by_role(RoleLevel::L2).len(), 1);

    breaks
        .start_break(&"a1".into(), BreakType::Tea)
        .await
        .expect("Break start failed");
    assert!(breaks.elapsed(&"a1".into()) >= std::time::Duration::ZERO);

    // Rotation skips the agent the break API put on break.
    let outcome = client
        .dispatch(Lead::new("lead-1"))
        .await
        .expect("Dispatch failed");
    let record = outcome.assignment().expect("Should be assigned");
    assert_eq!(record.agent_id, "a2".into());

    assert_eq!(client.recent_assignments(10).len(), 1);

    let stats = admin.stats().await.expect("Stats should be readable");
    assert_eq!(stats.agents_tracked, 2);
    assert_eq!(stats.agents_on_break, 1);
    assert_eq!(stats.active_rules, 1);
    assert_eq!(stats.dispatch.assigned, 1);

    let history = breaks.break_history(&"a1".into());
    assert!(history.is_empty());
    breaks.end_break(&"a1".into()).await.expect("Break end failed");
    assert_eq!(breaks.break_history(&"a1".into()).len(), 1);
}
