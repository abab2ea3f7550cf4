//! Agent availability tracking
//!
//! Single source of truth for each agent's break state. The state machine
//! per agent is deliberately small:
//!
//! ```text
//! Available --start_break--> OnBreak --end_break--> Available
//! ```
//!
//! No other transitions are legal and breaks never auto-expire. Every
//! transition publishes an [`AvailabilityEvent`] on a broadcast channel so
//! that all sessions observing the same agent converge on the same state.
//! Subscribers that miss events (lagged receiver, reconnect) must re-read
//! the authoritative state via [`AvailabilityTracker::snapshot`].
//!
//! Transitions on the same agent are serialized with a per-agent async
//! mutex; transitions on different agents never contend.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::agent::types::{ActiveBreak, AgentId, Availability, BreakSession, BreakType};
use crate::config::{BreakSettings, EventSettings};
use crate::error::{DispatchError, Result};

/// Availability change notification, published on every transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityEvent {
    /// Agent whose state changed
    pub agent_id: AgentId,

    /// State after the transition
    pub availability: Availability,

    /// Break category when the transition started a break, `None` when
    /// it ended one
    pub break_type: Option<BreakType>,

    /// When the transition happened
    pub occurred_at: DateTime<Utc>,
}

/// Per-agent row in an availability snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAvailability {
    pub agent_id: AgentId,
    pub availability: Availability,
    pub break_type: Option<BreakType>,
}

/// Authoritative availability snapshot
///
/// The re-read target for observers that reconnect or lag behind the
/// event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySummary {
    /// Tracked agents
    pub total: usize,

    /// Agents currently available
    pub available: usize,

    /// Agents currently on break
    pub on_break: usize,

    /// Per-agent rows, ordered by agent id
    pub agents: Vec<AgentAvailability>,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

/// Live state held per tracked agent
///
/// `current_break` is `Some` exactly while `availability` is `OnBreak`;
/// both fields move together under the agent's transition lock.
struct AgentState {
    availability: Availability,
    current_break: Option<ActiveBreak>,
}

/// Tracks break/available state for every agent the engine routes to
pub struct AvailabilityTracker {
    /// Map of agent id to live state
    states: Arc<DashMap<AgentId, AgentState>>,

    /// Completed break sessions per agent, oldest first
    history: Arc<DashMap<AgentId, Vec<BreakSession>>>,

    /// Per-agent transition guards
    transition_locks: Arc<DashMap<AgentId, Arc<Mutex<()>>>>,

    /// Availability change feed
    events: broadcast::Sender<AvailabilityEvent>,

    breaks: BreakSettings,
}

impl AvailabilityTracker {
    pub fn new(breaks: BreakSettings, events: EventSettings) -> Self {
        let (events, _) = broadcast::channel(events.broadcast_capacity);

        Self {
            states: Arc::new(DashMap::new()),
            history: Arc::new(DashMap::new()),
            transition_locks: Arc::new(DashMap::new()),
            events,
            breaks,
        }
    }

    /// Begin tracking an agent as `Available`
    ///
    /// Idempotent: tracking an agent that is already tracked leaves its
    /// current state (including an open break) untouched.
    pub fn track(&self, agent_id: AgentId) {
        self.states.entry(agent_id.clone()).or_insert_with(|| {
            debug!("Tracking availability for agent {}", agent_id);
            AgentState {
                availability: Availability::Available,
                current_break: None,
            }
        });
    }

    /// Stop tracking an agent, dropping its state and break history
    pub fn untrack(&self, agent_id: &AgentId) {
        self.states.remove(agent_id);
        self.history.remove(agent_id);
        self.transition_locks.remove(agent_id);
        debug!("Stopped tracking agent {}", agent_id);
    }

    /// True when the agent is tracked
    pub fn is_tracked(&self, agent_id: &AgentId) -> bool {
        self.states.contains_key(agent_id)
    }

    /// Put an agent on break
    ///
    /// Fails with `NotFound` for untracked agents and `AlreadyOnBreak`
    /// when a break is already open. On success the returned
    /// [`ActiveBreak`] carries the authoritative start timestamp.
    pub async fn start_break(
        &self,
        agent_id: &AgentId,
        break_type: BreakType,
    ) -> Result<ActiveBreak> {
        let lock = self.transition_lock(agent_id);
        let _guard = lock.lock().await;

        let mut state = self
            .states
            .get_mut(agent_id)
            .ok_or_else(|| DispatchError::not_found(format!("agent {}", agent_id)))?;

        if state.availability == Availability::OnBreak {
            return Err(DispatchError::already_on_break(format!(
                "agent {}",
                agent_id
            )));
        }

        let active = ActiveBreak {
            break_type,
            started_at: Utc::now(),
        };
        state.availability = Availability::OnBreak;
        state.current_break = Some(active.clone());

        drop(state);

        info!("Agent {} started {} break", agent_id, break_type);
        self.publish(AvailabilityEvent {
            agent_id: agent_id.clone(),
            availability: Availability::OnBreak,
            break_type: Some(break_type),
            occurred_at: active.started_at,
        });

        Ok(active)
    }

    /// Take an agent off break
    ///
    /// Fails with `NotFound` for untracked agents and `NotOnBreak` when
    /// no break is open. On success the completed [`BreakSession`] is
    /// returned and, when history is enabled, retained.
    pub async fn end_break(&self, agent_id: &AgentId) -> Result<BreakSession> {
        let lock = self.transition_lock(agent_id);
        let _guard = lock.lock().await;

        let session = {
            let mut state = self
                .states
                .get_mut(agent_id)
                .ok_or_else(|| DispatchError::not_found(format!("agent {}", agent_id)))?;

            let Some(active) = state.current_break.take() else {
                return Err(DispatchError::not_on_break(format!("agent {}", agent_id)));
            };
            state.availability = Availability::Available;

            BreakSession {
                agent_id: agent_id.clone(),
                break_type: active.break_type,
                started_at: active.started_at,
                ended_at: Some(Utc::now()),
            }
        };

        if self.breaks.enable_history {
            let mut entry = self.history.entry(agent_id.clone()).or_default();
            entry.push(session.clone());
            while entry.len() > self.breaks.max_history_entries {
                entry.remove(0);
            }
        }

        info!("Agent {} ended {} break", agent_id, session.break_type);
        self.publish(AvailabilityEvent {
            agent_id: agent_id.clone(),
            availability: Availability::Available,
            break_type: None,
            occurred_at: session.ended_at.unwrap_or_else(Utc::now),
        });

        Ok(session)
    }

    /// Time spent on the current break
    ///
    /// Pure read for display: zero for available or untracked agents.
    /// Never triggers a transition; breaks do not expire on their own.
    pub fn elapsed(&self, agent_id: &AgentId) -> Duration {
        match self.states.get(agent_id) {
            Some(state) => match &state.current_break {
                Some(active) => (Utc::now() - active.started_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO),
                None => Duration::ZERO,
            },
            None => Duration::ZERO,
        }
    }

    /// Current availability, `None` for untracked agents
    pub fn availability(&self, agent_id: &AgentId) -> Option<Availability> {
        self.states.get(agent_id).map(|state| state.availability)
    }

    /// True when the agent is tracked and available
    ///
    /// Untracked agents are treated as unavailable so that stale roster
    /// references are skipped by rotation rather than assigned to.
    pub fn is_available(&self, agent_id: &AgentId) -> bool {
        self.availability(agent_id)
            .map(|availability| availability.is_available())
            .unwrap_or(false)
    }

    /// The break an agent is currently on, if any
    pub fn current_break(&self, agent_id: &AgentId) -> Option<ActiveBreak> {
        self.states
            .get(agent_id)
            .and_then(|state| state.current_break.clone())
    }

    /// Completed break sessions for an agent, oldest first
    pub fn break_history(&self, agent_id: &AgentId) -> Vec<BreakSession> {
        self.history
            .get(agent_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Authoritative snapshot of every tracked agent
    pub fn snapshot(&self) -> AvailabilitySummary {
        let mut agents: Vec<AgentAvailability> = self
            .states
            .iter()
            .map(|entry| AgentAvailability {
                agent_id: entry.key().clone(),
                availability: entry.availability,
                break_type: entry.current_break.as_ref().map(|b| b.break_type),
            })
            .collect();
        agents.sort_by(|a, b| a.agent_id.0.cmp(&b.agent_id.0));

        let on_break = agents
            .iter()
            .filter(|row| row.availability == Availability::OnBreak)
            .count();

        AvailabilitySummary {
            total: agents.len(),
            available: agents.len() - on_break,
            on_break,
            agents,
            taken_at: Utc::now(),
        }
    }

    /// Subscribe to the availability change feed
    ///
    /// On `RecvError::Lagged` the receiver should re-read via
    /// [`snapshot`](Self::snapshot) before trusting further events.
    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityEvent> {
        self.events.subscribe()
    }

    fn transition_lock(&self, agent_id: &AgentId) -> Arc<Mutex<()>> {
        self.transition_locks
            .entry(agent_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn publish(&self, event: AvailabilityEvent) {
        // Send fails only when no subscriber is listening, which is fine.
        let _ = self.events.send(event);
    }
}
