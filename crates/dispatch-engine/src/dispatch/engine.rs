//! Dispatch orchestration
//!
//! [`DispatchEngine`] wires the rule store, the matcher, the round-robin
//! selector, and the availability tracker into the one call external
//! collaborators use: [`DispatchEngine::dispatch`]. A dispatch takes an
//! ordered snapshot of active rules, resolves the winning rule, then
//! enters that rule's critical section to pick an agent and advance the
//! rotation cursor. Unrelated rules dispatch in parallel; two dispatches
//! hitting the same rule are serialized so the cursor never tears.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::agent::availability::{AvailabilityEvent, AvailabilitySummary, AvailabilityTracker};
use crate::agent::directory::AgentDirectory;
use crate::agent::types::{
    ActiveBreak, Agent, AgentId, Availability, BreakSession, BreakType, RoleLevel,
};
use crate::config::EngineConfig;
use crate::dispatch::types::{AssignmentRecord, DispatchOutcome, DispatchStats, EngineStats};
use crate::error::{DispatchError, Result};
use crate::rules::matcher;
use crate::rules::store::{InMemoryRuleStore, RuleStore};
use crate::rules::types::{Lead, Rule, RuleId};
use crate::routing::selector;

/// Lead dispatch engine
///
/// Composes the rule store, agent directory, and availability tracker
/// behind one shared handle. Construct with [`DispatchEngine::new`] or
/// through the [`builder`](DispatchEngine::builder).
///
/// # Examples
///
/// ```
/// use leadroute_dispatch_engine::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let engine = DispatchEngine::new(EngineConfig::default()).await?;
///
/// engine.register_agent(Agent::new("agent-001", "Asha")).await?;
/// engine
///     .upsert_rule(Rule::new(
///         "catch-all",
///         "Catch all",
///         100,
///         RuleCriteria::new(),
///         vec!["agent-001".into()],
///     ))
///     .await?;
///
/// let outcome = engine.dispatch(Lead::new("lead-1")).await?;
/// assert!(outcome.is_assigned());
/// # Ok(())
/// # }
/// ```
pub struct DispatchEngine {
    /// Engine configuration
    config: EngineConfig,

    /// Rule storage
    rules: Arc<dyn RuleStore>,

    /// Roster read-model
    directory: Arc<AgentDirectory>,

    /// Break/available state
    availability: Arc<AvailabilityTracker>,

    /// Per-rule dispatch critical sections
    rule_locks: Arc<DashMap<RuleId, Arc<Mutex<()>>>>,

    /// Recent assignments, oldest first, capped by configuration
    assignments: Arc<RwLock<Vec<AssignmentRecord>>>,

    /// Dispatch call counters
    stats: Arc<RwLock<DispatchStats>>,
}

impl DispatchEngine {
    /// Create an engine with the default in-memory rule store
    pub async fn new(config: EngineConfig) -> Result<Arc<Self>> {
        let store = Arc::new(InMemoryRuleStore::new(
            config.rules.clone(),
            config.general.max_rules,
        ));
        Self::with_rule_store(config, store).await
    }

    /// Create an engine over a caller-provided rule store
    ///
    /// The seam for deployments that persist rules elsewhere; the store
    /// must uphold the ordering and cursor invariants documented on
    /// [`RuleStore`].
    pub async fn with_rule_store(
        config: EngineConfig,
        rules: Arc<dyn RuleStore>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let availability = Arc::new(AvailabilityTracker::new(
            config.breaks.clone(),
            config.events.clone(),
        ));

        let engine = Arc::new(Self {
            config,
            rules,
            directory: Arc::new(AgentDirectory::new()),
            availability,
            rule_locks: Arc::new(DashMap::new()),
            assignments: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(DispatchStats::default())),
        });

        info!("Dispatch engine initialized");
        Ok(engine)
    }

    /// Start building an engine with agents and rules preloaded
    pub fn builder() -> DispatchEngineBuilder {
        DispatchEngineBuilder::new()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Route one lead to an agent
    ///
    /// Never blocks waiting for availability: when the matched rule's
    /// whole roster is on break the call returns
    /// [`DispatchOutcome::AllBusy`] immediately and performs no side
    /// effect, leaving retry or queueing to the caller. The only side
    /// effects of a successful call are one cursor advance on the winning
    /// rule and one retained [`AssignmentRecord`].
    pub async fn dispatch(&self, lead: Lead) -> Result<DispatchOutcome> {
        self.stats.write().dispatched += 1;

        let snapshot = self.rules.list_active_rules().await?;
        let Some(matched) = matcher::find_matching_rule(&snapshot, &lead) else {
            debug!("No rule matched lead {}", lead.reference);
            self.stats.write().no_match += 1;
            return Ok(DispatchOutcome::NoMatch);
        };
        let rule_id = matched.id.clone();
        debug!("Lead {} matched rule {}", lead.reference, rule_id);

        let lock = self.rule_lock(&rule_id);
        let _guard = lock.lock().await;

        // Re-read under the lock so concurrent dispatches see each
        // other's cursor advances. A rule deleted mid-flight completes
        // against the snapshot copy with no cursor write-back.
        let live_rule = self.rules.get(&rule_id).await?;
        let rule = match &live_rule {
            Some(rule) => rule,
            None => {
                warn!(
                    "Rule {} deleted during dispatch, completing against snapshot",
                    rule_id
                );
                matched
            }
        };

        let selection = selector::select_next(&rule.agents, rule.cursor(), |agent_id| {
            self.availability.is_available(agent_id)
        });
        let Some(selection) = selection else {
            debug!(
                "All {} agents on rule {} are on break",
                rule.agents.len(),
                rule_id
            );
            self.stats.write().all_busy += 1;
            return Ok(DispatchOutcome::AllBusy { rule_id });
        };

        if live_rule.is_some() {
            match self.rules.advance_cursor(&rule_id, selection.next_cursor).await {
                Ok(()) => {}
                Err(DispatchError::NotFound(_)) => {
                    warn!("Rule {} deleted before cursor advance", rule_id);
                }
                Err(e) => return Err(e),
            }
        }

        let record =
            AssignmentRecord::new(lead.reference.clone(), rule_id.clone(), selection.agent_id);
        {
            let mut log = self.assignments.write();
            log.push(record.clone());
            while log.len() > self.config.general.assignment_history_limit {
                log.remove(0);
            }
        }
        self.stats.write().assigned += 1;

        info!(
            "Lead {} assigned to agent {} via rule {}",
            record.lead_ref, record.agent_id, record.rule_id
        );
        Ok(DispatchOutcome::Assigned(record))
    }

    /// Recent assignments, newest first
    pub fn recent_assignments(&self, limit: usize) -> Vec<AssignmentRecord> {
        self.assignments
            .read()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Point-in-time engine overview
    pub async fn stats(&self) -> Result<EngineStats> {
        let summary = self.availability.snapshot();
        let rules = self.rules.list_rules().await?;
        let active_rules = rules.iter().filter(|rule| rule.active).count();

        Ok(EngineStats {
            agents_tracked: summary.total,
            agents_available: summary.available,
            agents_on_break: summary.on_break,
            total_rules: rules.len(),
            active_rules,
            dispatch: self.stats.read().clone(),
        })
    }

    // ========================================================================
    // Agent roster
    // ========================================================================

    /// Add or update one agent and track its availability
    pub async fn register_agent(&self, agent: Agent) -> Result<()> {
        if !self.directory.contains(&agent.id)
            && self.directory.len() >= self.config.general.max_agents
        {
            return Err(DispatchError::configuration(format!(
                "agent limit reached (general.max_agents = {})",
                self.config.general.max_agents
            )));
        }

        let agent_id = agent.id.clone();
        self.directory.upsert_agent(agent).await?;
        self.availability.track(agent_id);
        Ok(())
    }

    /// Replace the whole roster from the external directory
    ///
    /// Agents that left the roster are untracked; agents already tracked
    /// keep their current break state.
    pub async fn sync_agents(&self, roster: Vec<Agent>) -> Result<()> {
        if roster.len() > self.config.general.max_agents {
            return Err(DispatchError::configuration(format!(
                "roster exceeds agent limit (general.max_agents = {})",
                self.config.general.max_agents
            )));
        }

        let fresh: HashSet<AgentId> = roster.iter().map(|agent| agent.id.clone()).collect();
        self.directory.sync_agents(roster).await?;

        for row in self.availability.snapshot().agents {
            if !fresh.contains(&row.agent_id) {
                self.availability.untrack(&row.agent_id);
            }
        }
        for agent_id in fresh {
            self.availability.track(agent_id);
        }

        info!("Roster synced, {} agents tracked", self.directory.len());
        Ok(())
    }

    /// Remove one agent and drop its availability state
    pub async fn remove_agent(&self, agent_id: &AgentId) -> Result<()> {
        self.directory.remove_agent(agent_id).await?;
        self.availability.untrack(agent_id);
        Ok(())
    }

    /// Agent profile from the roster
    pub fn get_agent(&self, agent_id: &AgentId) -> Option<Agent> {
        self.directory.get(agent_id)
    }

    /// All agents, ordered by id
    pub fn list_agents(&self) -> Vec<Agent> {
        self.directory.list()
    }

    /// Agents at one role level, ordered by id
    pub fn agents_by_role(&self, role_level: RoleLevel) -> Vec<Agent> {
        self.directory.list_by_role(role_level)
    }

    // ========================================================================
    // Rules
    // ========================================================================

    /// Create or update a rule
    pub async fn upsert_rule(&self, rule: Rule) -> Result<()> {
        self.rules.upsert(rule).await
    }

    /// Flip a rule's active flag, returning the new state
    ///
    /// Toggling never touches rotation state: deactivate and reactivate
    /// a rule and its cursor picks up where it left off.
    pub async fn toggle_rule(&self, rule_id: &RuleId) -> Result<bool> {
        self.rules.toggle_active(rule_id).await
    }

    /// Delete a rule and its dispatch lock
    pub async fn delete_rule(&self, rule_id: &RuleId) -> Result<()> {
        self.rules.delete(rule_id).await?;
        self.rule_locks.remove(rule_id);
        Ok(())
    }

    /// Fetch one rule
    pub async fn get_rule(&self, rule_id: &RuleId) -> Result<Option<Rule>> {
        self.rules.get(rule_id).await
    }

    /// All rules ordered by `(priority, creation order)`
    pub async fn list_rules(&self) -> Result<Vec<Rule>> {
        self.rules.list_rules().await
    }

    /// Active rules ordered by `(priority, creation order)`
    pub async fn list_active_rules(&self) -> Result<Vec<Rule>> {
        self.rules.list_active_rules().await
    }

    // ========================================================================
    // Breaks
    // ========================================================================

    /// Put an agent on break
    pub async fn start_break(
        &self,
        agent_id: &AgentId,
        break_type: BreakType,
    ) -> Result<ActiveBreak> {
        self.availability.start_break(agent_id, break_type).await
    }

    /// Take an agent off break
    pub async fn end_break(&self, agent_id: &AgentId) -> Result<BreakSession> {
        self.availability.end_break(agent_id).await
    }

    /// Time spent on the current break, zero when not on break
    pub fn elapsed(&self, agent_id: &AgentId) -> Duration {
        self.availability.elapsed(agent_id)
    }

    /// Current availability, `None` for untracked agents
    pub fn availability(&self, agent_id: &AgentId) -> Option<Availability> {
        self.availability.availability(agent_id)
    }

    /// The break an agent is currently on, if any
    pub fn current_break(&self, agent_id: &AgentId) -> Option<ActiveBreak> {
        self.availability.current_break(agent_id)
    }

    /// Completed break sessions for an agent, oldest first
    pub fn break_history(&self, agent_id: &AgentId) -> Vec<BreakSession> {
        self.availability.break_history(agent_id)
    }

    /// Authoritative snapshot of every tracked agent
    pub fn availability_snapshot(&self) -> AvailabilitySummary {
        self.availability.snapshot()
    }

    /// Subscribe to availability change events
    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityEvent> {
        self.availability.subscribe()
    }

    // ========================================================================
    // Subsystem access
    // ========================================================================

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The rule store behind this engine
    pub fn rule_store(&self) -> Arc<dyn RuleStore> {
        self.rules.clone()
    }

    /// The availability tracker behind this engine
    pub fn availability_tracker(&self) -> Arc<AvailabilityTracker> {
        self.availability.clone()
    }

    fn rule_lock(&self, rule_id: &RuleId) -> Arc<Mutex<()>> {
        self.rule_locks
            .entry(rule_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Builder for engines preloaded with a roster and rules
///
/// ```
/// use leadroute_dispatch_engine::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let engine = DispatchEngine::builder()
///     .with_agent(Agent::new("agent-001", "Asha"))
///     .with_rule(Rule::new(
///         "catch-all",
///         "Catch all",
///         100,
///         RuleCriteria::new(),
///         vec!["agent-001".into()],
///     ))
///     .build()
///     .await?;
///
/// assert_eq!(engine.list_agents().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct DispatchEngineBuilder {
    config: EngineConfig,
    agents: Vec<Agent>,
    rules: Vec<Rule>,
}

impl DispatchEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            agents: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Use a custom configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Preload one agent
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Preload several agents
    pub fn with_agents(mut self, agents: impl IntoIterator<Item = Agent>) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Preload one rule
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Preload several rules
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Validate the configuration and bring the engine up
    pub async fn build(self) -> Result<Arc<DispatchEngine>> {
        let engine = DispatchEngine::new(self.config).await?;
        for agent in self.agents {
            engine.register_agent(agent).await?;
        }
        for rule in self.rules {
            engine.upsert_rule(rule).await?;
        }
        Ok(engine)
    }
}
