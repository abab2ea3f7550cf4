//! Agent tracking module
//!
//! Agents are owned by an external directory service; this module mirrors
//! the roster the engine routes to ([`AgentDirectory`]) and owns the one
//! piece of agent state the engine is authoritative for: break/available
//! status ([`AvailabilityTracker`]).
//!
//! # Examples
//!
//! ```
//! use leadroute_dispatch_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let tracker = AvailabilityTracker::new(BreakSettings::default(), EventSettings::default());
//! tracker.track("agent-001".into());
//!
//! tracker.start_break(&"agent-001".into(), BreakType::Lunch).await?;
//! assert!(!tracker.is_available(&"agent-001".into()));
//!
//! tracker.end_break(&"agent-001".into()).await?;
//! assert!(tracker.is_available(&"agent-001".into()));
//! # Ok(())
//! # }
//! ```

pub mod availability;
pub mod directory;
pub mod types;

pub use availability::{
    AgentAvailability, AvailabilityEvent, AvailabilitySummary, AvailabilityTracker,
};
pub use directory::AgentDirectory;
pub use types::{ActiveBreak, Agent, AgentId, Availability, BreakSession, BreakType, RoleLevel};
