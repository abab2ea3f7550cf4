//! Routing rules: types, storage, and matching
//!
//! A rule binds per-dimension accepted value sets to an ordered agent
//! roster. Matching is first-match over the `(priority, creation order)`
//! listing; rotation state lives on the rule but is moved only by the
//! dispatch path.

pub mod matcher;
pub mod store;
pub mod types;

pub use matcher::{find_matching_rule, rule_matches};
pub use store::{InMemoryRuleStore, RuleStore};
pub use types::{Dimension, Lead, Rule, RuleCriteria, RuleId};
