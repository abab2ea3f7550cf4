//! Core types for agent tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent identifier type for strongly-typed agent references
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Generate a fresh agent id
    pub fn new() -> Self {
        AgentId(format!("agent-{}", uuid::Uuid::new_v4()))
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        AgentId(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Agent tier within the counselling organisation
///
/// Used by administrators to scope which rules reference an agent. It
/// plays no part in lead matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleLevel {
    /// Entry-level counsellor
    L1,
    /// Senior counsellor
    L2,
    /// Team lead
    L3,
}

impl std::str::FromStr for RoleLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "l1" | "L1" => Ok(RoleLevel::L1),
            "l2" | "L2" => Ok(RoleLevel::L2),
            "l3" | "L3" => Ok(RoleLevel::L3),
            _ => Err(format!("Unknown role level: {}", s)),
        }
    }
}

impl fmt::Display for RoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleLevel::L1 => write!(f, "L1"),
            RoleLevel::L2 => write!(f, "L2"),
            RoleLevel::L3 => write!(f, "L3"),
        }
    }
}

/// Agent profile as synced from the external directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier
    pub id: AgentId,

    /// Human-readable agent name
    pub name: String,

    /// Agent tier, not used for matching
    pub role_level: RoleLevel,
}

impl Agent {
    /// Create an agent profile with the default L1 role
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role_level: RoleLevel::L1,
        }
    }

    /// Set the agent's role level
    pub fn with_role(mut self, role_level: RoleLevel) -> Self {
        self.role_level = role_level;
        self
    }
}

/// Agent availability state
///
/// Only two states exist and only two transitions are legal:
/// `Available --start_break--> OnBreak --end_break--> Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    /// Agent can receive lead assignments
    Available,

    /// Agent is on break and is skipped by rotation
    OnBreak,
}

impl Availability {
    /// True when the agent can receive assignments
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "available" | "Available" | "AVAILABLE" => Ok(Availability::Available),
            "on_break" | "onbreak" | "OnBreak" | "ON_BREAK" => Ok(Availability::OnBreak),
            _ => Err(format!("Unknown availability: {}", s)),
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::OnBreak => write!(f, "on_break"),
        }
    }
}

/// Break category carried on sessions and events for display
///
/// No behavioral difference between types; rotation only cares whether
/// the agent is on break at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakType {
    Lunch,
    Tea,
    Meeting,
    Training,
    Other,
}

impl std::str::FromStr for BreakType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lunch" | "Lunch" => Ok(BreakType::Lunch),
            "tea" | "Tea" => Ok(BreakType::Tea),
            "meeting" | "Meeting" => Ok(BreakType::Meeting),
            "training" | "Training" => Ok(BreakType::Training),
            "other" | "Other" => Ok(BreakType::Other),
            _ => Err(format!("Unknown break type: {}", s)),
        }
    }
}

impl fmt::Display for BreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakType::Lunch => write!(f, "lunch"),
            BreakType::Tea => write!(f, "tea"),
            BreakType::Meeting => write!(f, "meeting"),
            BreakType::Training => write!(f, "training"),
            BreakType::Other => write!(f, "other"),
        }
    }
}

/// The break an agent is currently on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBreak {
    /// Break category
    pub break_type: BreakType,

    /// When the break started
    pub started_at: DateTime<Utc>,
}

/// Completed or in-progress break history record
///
/// At most one session per agent has `ended_at = None` at any time; the
/// tracker enforces this by refusing to start a second break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakSession {
    /// Agent the session belongs to
    pub agent_id: AgentId,

    /// Break category
    pub break_type: BreakType,

    /// When the break started
    pub started_at: DateTime<Utc>,

    /// When the break ended, `None` while the break is still open
    pub ended_at: Option<DateTime<Utc>>,
}

impl BreakSession {
    /// Length of the session, `None` while the break is still open
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|ended| ended - self.started_at)
    }
}
