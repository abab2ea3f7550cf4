use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Dispatch engine configuration
///
/// # Configuration Sections
///
/// - [`general`](EngineConfig::general): roster and history limits
/// - [`rules`](EngineConfig::rules): rule validation caps
/// - [`breaks`](EngineConfig::breaks): break history retention
/// - [`events`](EngineConfig::events): availability event channel sizing
///
/// # Examples
///
/// ```
/// use leadroute_dispatch_engine::prelude::EngineConfig;
///
/// let mut config = EngineConfig::default();
/// config.general.max_agents = 1000;
/// config.validate().expect("configuration should be valid");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// General engine limits
    pub general: GeneralConfig,

    /// Rule validation settings
    pub rules: RuleSettings,

    /// Break tracking and history settings
    pub breaks: BreakSettings,

    /// Availability event feed settings
    pub events: EventSettings,
}

/// General engine limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Maximum number of agents the directory will accept
    pub max_agents: usize,

    /// Maximum number of rules the store will accept
    pub max_rules: usize,

    /// Maximum number of assignment records retained in memory
    ///
    /// Oldest records are evicted first once the limit is reached. The
    /// ingestion pipeline is expected to persist records it cares about.
    pub assignment_history_limit: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_agents: 500,
            max_rules: 200,
            assignment_history_limit: 10_000,
        }
    }
}

/// Rule validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Maximum number of agents a single rule may reference
    pub max_roster_size: usize,

    /// Maximum number of accepted values per criteria dimension
    pub max_values_per_dimension: usize,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            max_roster_size: 50,
            max_values_per_dimension: 100,
        }
    }
}

/// Break tracking and history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakSettings {
    /// Whether completed break sessions are retained per agent
    pub enable_history: bool,

    /// Maximum completed break sessions retained per agent
    ///
    /// Oldest sessions are evicted first. Ignored when `enable_history`
    /// is false.
    pub max_history_entries: usize,
}

impl Default for BreakSettings {
    fn default() -> Self {
        Self {
            enable_history: true,
            max_history_entries: 1000,
        }
    }
}

/// Availability event feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    /// Capacity of the broadcast channel carrying availability events
    ///
    /// Slow subscribers that fall more than this many events behind
    /// receive a lag notification and should re-read the availability
    /// snapshot.
    pub broadcast_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            broadcast_capacity: 1024,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            rules: RuleSettings::default(),
            breaks: BreakSettings::default(),
            events: EventSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration
    ///
    /// Checks numeric constraints across all sections. Returns a
    /// `Configuration` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.general.max_agents == 0 {
            return Err(DispatchError::configuration(
                "general.max_agents must be greater than 0",
            ));
        }

        if self.general.max_rules == 0 {
            return Err(DispatchError::configuration(
                "general.max_rules must be greater than 0",
            ));
        }

        if self.rules.max_roster_size == 0 {
            return Err(DispatchError::configuration(
                "rules.max_roster_size must be greater than 0",
            ));
        }

        if self.rules.max_values_per_dimension == 0 {
            return Err(DispatchError::configuration(
                "rules.max_values_per_dimension must be greater than 0",
            ));
        }

        if self.breaks.enable_history && self.breaks.max_history_entries == 0 {
            return Err(DispatchError::configuration(
                "breaks.max_history_entries must be greater than 0 when history is enabled",
            ));
        }

        if self.events.broadcast_capacity == 0 {
            return Err(DispatchError::configuration(
                "events.broadcast_capacity must be greater than 0",
            ));
        }

        Ok(())
    }
}
