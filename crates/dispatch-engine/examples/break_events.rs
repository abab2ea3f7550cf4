//! Break tracking example for leadroute-dispatch-engine
//!
//! This example demonstrates:
//! - Watching availability transitions through the event feed
//! - Starting and ending breaks through the break API
//! - Reading elapsed break time and per-agent history
//! - Reconciling a late observer from the availability snapshot

use anyhow::Result;
use leadroute_dispatch_engine::{init, prelude::*};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    println!("🚀 Initializing the engine...");
    let engine = init(EngineConfig::default()).await?;
    let admin = AdminApi::new(engine.clone());
    let breaks = BreakApi::new(engine.clone());

    admin.add_agent(Agent::new("asha", "Asha Verma")).await?;
    admin.add_agent(Agent::new("ravi", "Ravi Iyer")).await?;

    // Subscribe before any transitions so nothing is missed.
    println!("\n📡 Subscribing to the availability feed...");
    let mut feed = breaks.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = feed.recv().await {
            match event.break_type {
                Some(kind) => println!("   🔔 {} went on a {} break", event.agent_id, kind),
                None => println!("   🔔 {} is available again", event.agent_id),
            }
        }
    });

    println!("\n☕ Asha takes a tea break...");
    breaks.start_break(&"asha".into(), BreakType::Tea).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("   ⏱️  away for {:?} so far", breaks.elapsed(&"asha".into()));

    println!("\n🍽️  Ravi heads to lunch...");
    breaks.start_break(&"ravi".into(), BreakType::Lunch).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n✅ Asha comes back...");
    let session = breaks.end_break(&"asha".into()).await?;
    println!(
        "   Logged a {} break of {:?}",
        session.break_type,
        session.duration().map(|d| d.to_std().unwrap_or_default())
    );

    // A dashboard that just connected has seen no events at all. It
    // reads the snapshot instead of replaying history.
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("\n📋 Late observer reconciling from the snapshot:");
    let summary = breaks.availability_snapshot();
    println!(
        "   {} tracked, {} available, {} on break",
        summary.total, summary.available, summary.on_break
    );
    for row in &summary.agents {
        match row.break_type {
            Some(kind) => println!("   - {} is on a {} break", row.agent_id, kind),
            None => println!("   - {} is available", row.agent_id),
        }
    }

    println!("\n📜 Asha's break history:");
    for session in breaks.break_history(&"asha".into()) {
        println!(
            "   - {} break started {}",
            session.break_type, session.started_at
        );
    }

    listener.abort();
    println!("\n✨ Example completed successfully!");
    Ok(())
}
