//! Basic dispatch example for leadroute-dispatch-engine
//!
//! This example demonstrates:
//! - Building an engine with a seeded roster and rules
//! - Dispatching leads and reading the outcome
//! - Round-robin rotation skipping an agent on break
//! - Inspecting the assignment log and engine statistics

use anyhow::Result;
use leadroute_dispatch_engine::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging based on environment
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    println!("🚀 Building the dispatch engine...");
    let engine = DispatchEngine::builder()
        .with_agent(Agent::new("asha", "Asha Verma").with_role(RoleLevel::L2))
        .with_agent(Agent::new("ravi", "Ravi Iyer"))
        .with_agent(Agent::new("meera", "Meera Pillai"))
        .with_rule(Rule::new(
            "website-eng",
            "Website engineering leads",
            1,
            RuleCriteria::new()
                .with_values(Dimension::Source, ["Website"])
                .with_values(Dimension::Stream, ["Engineering"]),
            vec!["asha".into(), "ravi".into()],
        ))
        .with_rule(Rule::new(
            "fallback",
            "Everything else",
            100,
            RuleCriteria::new(),
            vec!["meera".into()],
        ))
        .build()
        .await?;

    // A few incoming leads. The first three rotate through the website
    // rule's roster, the walk-in falls through to the catch-all.
    let leads = vec![
        Lead::new("web-1001")
            .with_value(Dimension::Source, "Website")
            .with_value(Dimension::Stream, "Engineering"),
        Lead::new("web-1002")
            .with_value(Dimension::Source, "Website")
            .with_value(Dimension::Stream, "Engineering")
            .with_value(Dimension::University, "NU"),
        Lead::new("web-1003")
            .with_value(Dimension::Source, "Website")
            .with_value(Dimension::Stream, "Engineering"),
        Lead::new("walkin-17").with_value(Dimension::Source, "Walk-in"),
    ];

    println!("\n📨 Dispatching leads...");
    for lead in leads {
        report(engine.dispatch(lead).await?);
    }

    // Put one agent on break and dispatch again. The rotation skips
    // them and hands the lead to the next agent in line.
    println!("\n☕ Asha steps away for lunch...");
    engine.start_break(&"asha".into(), BreakType::Lunch).await?;
    report(
        engine
            .dispatch(
                Lead::new("web-1004")
                    .with_value(Dimension::Source, "Website")
                    .with_value(Dimension::Stream, "Engineering"),
            )
            .await?,
    );
    engine.end_break(&"asha".into()).await?;

    // The newest record, as it would be persisted or shipped.
    println!("\n🧾 Latest assignment record:");
    if let Some(record) = engine.recent_assignments(1).first() {
        println!("{}", serde_json::to_string_pretty(record)?);
    }

    println!("\n📊 Engine statistics:");
    let stats = engine.stats().await?;
    println!("   Agents tracked:  {}", stats.agents_tracked);
    println!("   Active rules:    {}", stats.active_rules);
    println!("   Dispatched:      {}", stats.dispatch.dispatched);
    println!("   Assigned:        {}", stats.dispatch.assigned);
    println!("   No match:        {}", stats.dispatch.no_match);
    println!("   All busy:        {}", stats.dispatch.all_busy);

    println!("\n✨ Example completed successfully!");
    Ok(())
}

fn report(outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::Assigned(record) => {
            println!(
                "   ✅ {} assigned to {} (rule {})",
                record.lead_ref, record.agent_id, record.rule_id
            );
        }
        DispatchOutcome::NoMatch => println!("   ❌ no active rule matched"),
        DispatchOutcome::AllBusy { rule_id } => {
            println!("   ⏸️  rule {} matched but nobody is available", rule_id);
        }
    }
}
