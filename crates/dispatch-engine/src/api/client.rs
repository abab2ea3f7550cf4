//! Client APIs
//!
//! Two thin surfaces over a shared engine:
//!
//! - [`BreakApi`] for the break-management UI: start/end breaks, read
//!   elapsed time, subscribe to the availability feed.
//! - [`DispatchClient`] for the lead-ingestion pipeline: dispatch leads
//!   and read back recent assignments.
//!
//! Between them the engine stays the single source of truth; the break
//! UI should disable its buttons from observed state but can rely on the
//! engine rejecting illegal transitions under concurrent sessions.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::agent::availability::{AvailabilityEvent, AvailabilitySummary};
use crate::agent::types::{ActiveBreak, AgentId, Availability, BreakSession, BreakType};
use crate::dispatch::engine::DispatchEngine;
use crate::dispatch::types::{AssignmentRecord, DispatchOutcome};
use crate::error::Result;
use crate::rules::types::Lead;

/// Break management interface over a shared engine
///
/// # Examples
///
/// ```
/// use leadroute_dispatch_engine::prelude::*;
/// use leadroute_dispatch_engine::api::BreakApi;
///
/// # async fn example() -> Result<()> {
/// let engine = DispatchEngine::new(EngineConfig::default()).await?;
/// engine.register_agent(Agent::new("agent-001", "Asha")).await?;
///
/// let breaks = BreakApi::new(engine);
/// breaks.start_break(&"agent-001".into(), BreakType::Lunch).await?;
/// assert_eq!(breaks.availability(&"agent-001".into()), Some(Availability::OnBreak));
///
/// breaks.end_break(&"agent-001".into()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BreakApi {
    engine: Arc<DispatchEngine>,
}

impl BreakApi {
    /// Create a new break API instance
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }

    /// Put an agent on break
    ///
    /// Fails with `AlreadyOnBreak` when a break is already open. Callers
    /// that lost a response in transit should check
    /// [`availability`](Self::availability) before retrying instead of
    /// retrying blindly.
    pub async fn start_break(
        &self,
        agent_id: &AgentId,
        break_type: BreakType,
    ) -> Result<ActiveBreak> {
        self.engine.start_break(agent_id, break_type).await
    }

    /// Take an agent off break
    ///
    /// Fails with `NotOnBreak` when no break is open. The engine never
    /// ends a break on its own.
    pub async fn end_break(&self, agent_id: &AgentId) -> Result<BreakSession> {
        self.engine.end_break(agent_id).await
    }

    /// Time spent on the current break, zero when not on break
    pub fn elapsed(&self, agent_id: &AgentId) -> Duration {
        self.engine.elapsed(agent_id)
    }

    /// Current availability, `None` for untracked agents
    pub fn availability(&self, agent_id: &AgentId) -> Option<Availability> {
        self.engine.availability(agent_id)
    }

    /// The break an agent is currently on, if any
    pub fn current_break(&self, agent_id: &AgentId) -> Option<ActiveBreak> {
        self.engine.current_break(agent_id)
    }

    /// Completed break sessions for an agent, oldest first
    pub fn break_history(&self, agent_id: &AgentId) -> Vec<BreakSession> {
        self.engine.break_history(agent_id)
    }

    /// Authoritative snapshot of every tracked agent
    ///
    /// The full re-read for observers that reconnect or lag behind the
    /// event feed.
    pub fn availability_snapshot(&self) -> AvailabilitySummary {
        self.engine.availability_snapshot()
    }

    /// Subscribe to availability change events
    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityEvent> {
        self.engine.subscribe()
    }
}

/// Lead ingestion interface over a shared engine
///
/// # Examples
///
/// ```
/// use leadroute_dispatch_engine::prelude::*;
/// use leadroute_dispatch_engine::api::DispatchClient;
///
/// # async fn example(engine: std::sync::Arc<DispatchEngine>) -> Result<()> {
/// let client = DispatchClient::new(engine);
///
/// let lead = Lead::new("lead-42").with_value(Dimension::Source, "Website");
/// match client.dispatch(lead).await? {
///     DispatchOutcome::Assigned(record) => println!("agent {}", record.agent_id),
///     DispatchOutcome::NoMatch => println!("unassigned"),
///     DispatchOutcome::AllBusy { rule_id } => println!("retry later ({})", rule_id),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DispatchClient {
    engine: Arc<DispatchEngine>,
}

impl DispatchClient {
    /// Create a new dispatch client instance
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }

    /// Route one lead
    ///
    /// Returns immediately in all cases; `NoMatch` and `AllBusy` are
    /// outcomes for the pipeline to queue or retry, not errors.
    pub async fn dispatch(&self, lead: Lead) -> Result<DispatchOutcome> {
        self.engine.dispatch(lead).await
    }

    /// Recent assignments, newest first
    pub fn recent_assignments(&self, limit: usize) -> Vec<AssignmentRecord> {
        self.engine.recent_assignments(limit)
    }
}
