//! # Leadroute Dispatch Engine
//!
//! Routes incoming leads to counselling agents. Administrator-defined
//! rules decide which agent roster a lead belongs to; round-robin
//! rotation then distributes it fairly across that roster, skipping
//! agents who are on break.
//!
//! This crate provides:
//! - Rule storage with priority ordering and validation
//! - First-match rule evaluation over multi-valued criteria
//! - Per-rule round-robin rotation that survives concurrent dispatch
//! - Break/available tracking with a broadcast event feed
//! - Thin admin, break-UI, and ingestion APIs over one shared engine
//!
//! ## Architecture
//!
//! ```text
//!                       ┌──────────────┐
//!            lead ────> │  Dispatcher  │────> AssignmentRecord
//!                       └──────┬───────┘
//!              ┌───────────────┼─────────────────┐
//!              ▼               ▼                 ▼
//!       ┌────────────┐  ┌────────────┐  ┌──────────────────┐
//!       │ Rule Store │  │  Selector  │  │   Availability   │
//!       │ + Matcher  │  │(round-robin│  │     Tracker      │
//!       └────────────┘  │  cursor)   │  └──────────────────┘
//!                       └────────────┘
//! ```
//!
//! The dispatcher snapshots active rules, finds the first match in
//! `(priority, creation order)`, and inside that rule's critical section
//! selects the next available agent and advances the rotation cursor.
//! `NoMatch` and `AllBusy` are ordinary outcomes, never errors.
//!
//! ## Quick Start
//!
//! ```
//! use leadroute_dispatch_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = DispatchEngine::builder()
//!     .with_agents([Agent::new("asha", "Asha"), Agent::new("ravi", "Ravi")])
//!     .with_rule(Rule::new(
//!         "website",
//!         "Website leads",
//!         1,
//!         RuleCriteria::new().with_values(Dimension::Source, ["Website"]),
//!         vec!["asha".into(), "ravi".into()],
//!     ))
//!     .build()
//!     .await?;
//!
//! let lead = Lead::new("lead-1").with_value(Dimension::Source, "Website");
//! if let DispatchOutcome::Assigned(record) = engine.dispatch(lead).await? {
//!     println!("lead {} -> agent {}", record.lead_ref, record.agent_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod routing;
pub mod rules;

pub use agent::{
    ActiveBreak, Agent, AgentAvailability, AgentDirectory, AgentId, Availability,
    AvailabilityEvent, AvailabilitySummary, AvailabilityTracker, BreakSession, BreakType,
    RoleLevel,
};
pub use api::{AdminApi, BreakApi, DispatchClient};
pub use config::{BreakSettings, EngineConfig, EventSettings, GeneralConfig, RuleSettings};
pub use dispatch::{
    AssignmentRecord, DispatchEngine, DispatchEngineBuilder, DispatchOutcome, DispatchStats,
    EngineStats,
};
pub use error::{DispatchError, Result};
pub use rules::{Dimension, InMemoryRuleStore, Lead, Rule, RuleCriteria, RuleId, RuleStore};

/// Initialize a dispatch engine with the given configuration
pub async fn init(config: EngineConfig) -> Result<std::sync::Arc<DispatchEngine>> {
    DispatchEngine::new(config).await
}

/// Commonly used types for working with the dispatch engine
pub mod prelude {
    pub use crate::agent::{
        ActiveBreak, Agent, AgentAvailability, AgentDirectory, AgentId, Availability,
        AvailabilityEvent, AvailabilitySummary, AvailabilityTracker, BreakSession, BreakType,
        RoleLevel,
    };
    pub use crate::api::{AdminApi, BreakApi, DispatchClient};
    pub use crate::config::{
        BreakSettings, EngineConfig, EventSettings, GeneralConfig, RuleSettings,
    };
    pub use crate::dispatch::{
        AssignmentRecord, DispatchEngine, DispatchEngineBuilder, DispatchOutcome, DispatchStats,
        EngineStats,
    };
    pub use crate::error::{DispatchError, Result};
    pub use crate::routing::{select_next, Selection};
    pub use crate::rules::{
        find_matching_rule, rule_matches, Dimension, InMemoryRuleStore, Lead, Rule, RuleCriteria,
        RuleId, RuleStore,
    };
}
