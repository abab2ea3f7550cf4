//! Agent directory read-model
//!
//! Agents are created and removed by an external directory service; this
//! module only mirrors the subset the engine routes to. Availability
//! lives in [`AvailabilityTracker`](super::availability::AvailabilityTracker),
//! not here.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::agent::types::{Agent, AgentId, RoleLevel};
use crate::error::{DispatchError, Result};

/// In-memory agent roster
pub struct AgentDirectory {
    /// Map of agent id to profile
    agents: Arc<DashMap<AgentId, Agent>>,
}

impl AgentDirectory {
    pub fn new() -> Self {
        Self {
            agents: Arc::new(DashMap::new()),
        }
    }

    /// Replace the whole roster with a fresh sync from the directory service
    pub async fn sync_agents(&self, roster: Vec<Agent>) -> Result<()> {
        self.agents.clear();
        for agent in roster {
            self.agents.insert(agent.id.clone(), agent);
        }
        debug!("Synced {} agents from directory", self.agents.len());
        Ok(())
    }

    /// Insert or update a single agent profile
    pub async fn upsert_agent(&self, agent: Agent) -> Result<()> {
        self.agents
            .entry(agent.id.clone())
            .and_modify(|existing| {
                existing.name = agent.name.clone();
                existing.role_level = agent.role_level;
            })
            .or_insert(agent);
        Ok(())
    }

    /// Remove an agent from the roster
    pub async fn remove_agent(&self, agent_id: &AgentId) -> Result<()> {
        self.agents
            .remove(agent_id)
            .map(|_| ())
            .ok_or_else(|| DispatchError::not_found(format!("agent {}", agent_id)))
    }

    /// Get an agent's profile
    pub fn get(&self, agent_id: &AgentId) -> Option<Agent> {
        self.agents.get(agent_id).map(|entry| entry.clone())
    }

    /// True when the roster contains the agent
    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.agents.contains_key(agent_id)
    }

    /// All agents, ordered by id for stable listings
    pub fn list(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self.agents.iter().map(|entry| entry.clone()).collect();
        agents.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        agents
    }

    /// Agents at a given role level, ordered by id
    pub fn list_by_role(&self, role_level: RoleLevel) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .agents
            .iter()
            .filter(|entry| entry.role_level == role_level)
            .map(|entry| entry.clone())
            .collect();
        agents.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        agents
    }

    /// Number of agents in the roster
    pub fn len(&self) -> usize {
        self.agents.len()
    }
}
