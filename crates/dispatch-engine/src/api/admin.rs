//! Administrative API
//!
//! Surface for the rule-administration collaborator: rule CRUD, roster
//! sync from the external agent directory, and engine statistics. Errors
//! surface synchronously and are never retried here; `InvalidRule` is
//! meant to be shown to the administrator as a validation message.
//!
//! # Examples
//!
//! ```
//! use leadroute_dispatch_engine::prelude::*;
//! use leadroute_dispatch_engine::api::AdminApi;
//!
//! # async fn example() -> Result<()> {
//! let engine = DispatchEngine::new(EngineConfig::default()).await?;
//! let admin = AdminApi::new(engine);
//!
//! admin.add_agent(Agent::new("agent-001", "Asha")).await?;
//! admin
//!     .upsert_rule(Rule::new(
//!         "catch-all",
//!         "Catch all",
//!         100,
//!         RuleCriteria::new(),
//!         vec!["agent-001".into()],
//!     ))
//!     .await?;
//!
//! let stats = admin.stats().await?;
//! assert_eq!(stats.active_rules, 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::agent::types::{Agent, AgentId, RoleLevel};
use crate::dispatch::engine::DispatchEngine;
use crate::dispatch::types::EngineStats;
use crate::error::Result;
use crate::rules::types::{Rule, RuleId};

/// Administrative interface over a shared engine
#[derive(Clone)]
pub struct AdminApi {
    engine: Arc<DispatchEngine>,
}

impl AdminApi {
    /// Create a new admin API instance
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }

    // ========================================================================
    // Rules
    // ========================================================================

    /// Create or update a rule
    ///
    /// Rejects an active rule with an empty roster. Updates keep the
    /// rule's rotation state; administrators never manage cursors.
    pub async fn upsert_rule(&self, rule: Rule) -> Result<()> {
        self.engine.upsert_rule(rule).await
    }

    /// Flip a rule's active flag, returning the new state
    pub async fn toggle_rule(&self, rule_id: &RuleId) -> Result<bool> {
        self.engine.toggle_rule(rule_id).await
    }

    /// Delete a rule
    pub async fn delete_rule(&self, rule_id: &RuleId) -> Result<()> {
        self.engine.delete_rule(rule_id).await
    }

    /// Fetch one rule
    pub async fn get_rule(&self, rule_id: &RuleId) -> Result<Option<Rule>> {
        self.engine.get_rule(rule_id).await
    }

    /// All rules ordered by `(priority, creation order)`
    pub async fn list_rules(&self) -> Result<Vec<Rule>> {
        self.engine.list_rules().await
    }

    /// Active rules in matching order
    pub async fn list_active_rules(&self) -> Result<Vec<Rule>> {
        self.engine.list_active_rules().await
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Add or update one agent
    pub async fn add_agent(&self, agent: Agent) -> Result<()> {
        self.engine.register_agent(agent).await
    }

    /// Remove one agent
    pub async fn remove_agent(&self, agent_id: &AgentId) -> Result<()> {
        self.engine.remove_agent(agent_id).await
    }

    /// Replace the whole roster from the external directory
    pub async fn sync_agents(&self, roster: Vec<Agent>) -> Result<()> {
        self.engine.sync_agents(roster).await
    }

    /// All agents, ordered by id
    pub fn list_agents(&self) -> Vec<Agent> {
        self.engine.list_agents()
    }

    /// Agents at one role level, used to scope rule rosters
    pub fn agents_by_role(&self, role_level: RoleLevel) -> Vec<Agent> {
        self.engine.agents_by_role(role_level)
    }

    // ========================================================================
    // Monitoring
    // ========================================================================

    /// Point-in-time engine overview
    pub async fn stats(&self) -> Result<EngineStats> {
        self.engine.stats().await
    }
}
