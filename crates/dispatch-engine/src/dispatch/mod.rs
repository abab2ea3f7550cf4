//! Dispatch orchestration and outcome types
//!
//! The flow behind [`DispatchEngine::dispatch`]: snapshot active rules,
//! resolve the winning rule (or `NoMatch`), then inside that rule's
//! critical section pick the next available agent (or `AllBusy`), advance
//! the cursor, and retain the assignment record.

pub mod engine;
pub mod types;

pub use engine::{DispatchEngine, DispatchEngineBuilder};
pub use types::{AssignmentRecord, DispatchOutcome, DispatchStats, EngineStats};
