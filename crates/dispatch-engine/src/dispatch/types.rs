//! Dispatch outcomes and bookkeeping types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::types::AgentId;
use crate::rules::types::RuleId;

/// Immutable record linking a lead to an agent via a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Record identifier
    pub id: Uuid,

    /// Caller-side lead identifier, as given on the dispatched lead
    pub lead_ref: String,

    /// Rule that matched the lead
    pub rule_id: RuleId,

    /// Agent now responsible for the lead
    pub agent_id: AgentId,

    /// When the assignment was made
    pub assigned_at: DateTime<Utc>,
}

impl AssignmentRecord {
    pub fn new(lead_ref: impl Into<String>, rule_id: RuleId, agent_id: AgentId) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_ref: lead_ref.into(),
            rule_id,
            agent_id,
            assigned_at: Utc::now(),
        }
    }
}

/// Terminal outcome of a dispatch call
///
/// `NoMatch` and `AllBusy` are valid outcomes, not errors: the caller
/// decides whether to queue, retry, or park the lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    /// The lead was assigned
    Assigned(AssignmentRecord),

    /// No active rule's criteria matched the lead
    NoMatch,

    /// The matched rule's entire roster is on break
    AllBusy {
        /// The rule that matched but had nobody available
        rule_id: RuleId,
    },
}

impl DispatchOutcome {
    /// True when the lead was assigned
    pub fn is_assigned(&self) -> bool {
        matches!(self, DispatchOutcome::Assigned(_))
    }

    /// The assignment record, when one was produced
    pub fn assignment(&self) -> Option<&AssignmentRecord> {
        match self {
            DispatchOutcome::Assigned(record) => Some(record),
            _ => None,
        }
    }
}

/// Dispatch call counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Total dispatch calls
    pub dispatched: u64,

    /// Calls that produced an assignment
    pub assigned: u64,

    /// Calls where no rule matched
    pub no_match: u64,

    /// Calls where the matched roster was fully on break
    pub all_busy: u64,
}

/// Point-in-time engine overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    /// Agents with tracked availability
    pub agents_tracked: usize,

    /// Agents currently available
    pub agents_available: usize,

    /// Agents currently on break
    pub agents_on_break: usize,

    /// All stored rules
    pub total_rules: usize,

    /// Rules eligible for matching
    pub active_rules: usize,

    /// Dispatch call counters
    pub dispatch: DispatchStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors() {
        let record = AssignmentRecord::new("lead-1", "r1".into(), "a1".into());
        let assigned = DispatchOutcome::Assigned(record.clone());

        assert!(assigned.is_assigned());
        assert_eq!(assigned.assignment(), Some(&record));
        assert!(!DispatchOutcome::NoMatch.is_assigned());
        assert_eq!(
            DispatchOutcome::AllBusy { rule_id: "r1".into() }.assignment(),
            None
        );
    }
}
