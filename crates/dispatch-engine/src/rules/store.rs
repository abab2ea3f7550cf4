//! Rule storage
//!
//! The engine works against the [`RuleStore`] trait so deployments can
//! swap in a persistent store; [`InMemoryRuleStore`] is the default and
//! the reference for the store invariants:
//!
//! - an active rule always has a non-empty roster
//! - the cursor stays in `[0, len(agents))`, clamped on roster shrink
//! - toggling never resets rotation state
//! - active listings are ordered by `(priority, creation order)`

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::RuleSettings;
use crate::error::{DispatchError, Result};
use crate::rules::types::{Rule, RuleId};

/// Storage contract for routing rules
///
/// Mutations come from the administrative collaborator; `advance_cursor`
/// is engine-internal and only ever called under the rule's dispatch
/// lock.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active rules ordered by `(priority, creation order)`
    async fn list_active_rules(&self) -> Result<Vec<Rule>>;

    /// All rules, active or not, in the same ordering
    async fn list_rules(&self) -> Result<Vec<Rule>>;

    /// Fetch one rule
    async fn get(&self, rule_id: &RuleId) -> Result<Option<Rule>>;

    /// Insert a new rule or update an existing one
    ///
    /// Updates preserve the stored cursor and creation order; the
    /// incoming rule's rotation state is ignored.
    async fn upsert(&self, rule: Rule) -> Result<()>;

    /// Flip the active flag, returning the new state
    async fn toggle_active(&self, rule_id: &RuleId) -> Result<bool>;

    /// Remove a rule
    async fn delete(&self, rule_id: &RuleId) -> Result<()>;

    /// Persist a new cursor position after a selection
    async fn advance_cursor(&self, rule_id: &RuleId, cursor: usize) -> Result<()>;
}

struct StoredRule {
    rule: Rule,
    created_seq: u64,
}

/// DashMap-backed rule store
pub struct InMemoryRuleStore {
    entries: Arc<DashMap<RuleId, StoredRule>>,
    next_seq: AtomicU64,
    settings: RuleSettings,
    max_rules: usize,
}

impl InMemoryRuleStore {
    pub fn new(settings: RuleSettings, max_rules: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            next_seq: AtomicU64::new(0),
            settings,
            max_rules,
        }
    }

    /// Number of stored rules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn validate(&self, rule: &Rule) -> Result<()> {
        if rule.active && rule.agents.is_empty() {
            return Err(DispatchError::invalid_rule(format!(
                "rule {} is active but has no agents",
                rule.id
            )));
        }

        if rule.agents.len() > self.settings.max_roster_size {
            return Err(DispatchError::invalid_rule(format!(
                "rule {} roster exceeds max_roster_size ({})",
                rule.id, self.settings.max_roster_size
            )));
        }

        let distinct: HashSet<_> = rule.agents.iter().collect();
        if distinct.len() != rule.agents.len() {
            return Err(DispatchError::invalid_rule(format!(
                "rule {} roster contains duplicate agents",
                rule.id
            )));
        }

        for (dimension, values) in rule.criteria.iter() {
            if values.len() > self.settings.max_values_per_dimension {
                return Err(DispatchError::invalid_rule(format!(
                    "rule {} dimension {} exceeds max_values_per_dimension ({})",
                    rule.id, dimension, self.settings.max_values_per_dimension
                )));
            }
        }

        Ok(())
    }

    fn ordered(&self, include_inactive: bool) -> Vec<Rule> {
        let mut rules: Vec<(i32, u64, Rule)> = self
            .entries
            .iter()
            .filter(|entry| include_inactive || entry.rule.active)
            .map(|entry| (entry.rule.priority, entry.created_seq, entry.rule.clone()))
            .collect();
        rules.sort_by_key(|(priority, seq, _)| (*priority, *seq));
        rules.into_iter().map(|(_, _, rule)| rule).collect()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list_active_rules(&self) -> Result<Vec<Rule>> {
        Ok(self.ordered(false))
    }

    async fn list_rules(&self) -> Result<Vec<Rule>> {
        Ok(self.ordered(true))
    }

    async fn get(&self, rule_id: &RuleId) -> Result<Option<Rule>> {
        Ok(self.entries.get(rule_id).map(|entry| entry.rule.clone()))
    }

    async fn upsert(&self, mut rule: Rule) -> Result<()> {
        self.validate(&rule)?;

        let len_before = self.entries.len();
        match self.entries.entry(rule.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let stored = occupied.get_mut();
                let prior_cursor = stored.rule.cursor();
                // Rotation state is engine-owned: keep the prior cursor,
                // clamped into the new roster bounds.
                if rule.agents.is_empty() {
                    rule.set_cursor(0);
                } else {
                    rule.set_cursor(prior_cursor % rule.agents.len());
                }
                debug!("Updated rule {} (priority {})", rule.id, rule.priority);
                stored.rule = rule;
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                if len_before >= self.max_rules {
                    return Err(DispatchError::invalid_rule(format!(
                        "rule limit reached (general.max_rules = {})",
                        self.max_rules
                    )));
                }
                rule.set_cursor(0);
                let created_seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                info!("Created rule {} (priority {})", rule.id, rule.priority);
                vacant.insert(StoredRule { rule, created_seq });
            }
        }

        Ok(())
    }

    async fn toggle_active(&self, rule_id: &RuleId) -> Result<bool> {
        let mut entry = self
            .entries
            .get_mut(rule_id)
            .ok_or_else(|| DispatchError::not_found(format!("rule {}", rule_id)))?;

        let rule = &mut entry.rule;
        if !rule.active && rule.agents.is_empty() {
            return Err(DispatchError::invalid_rule(format!(
                "cannot activate rule {} without agents",
                rule_id
            )));
        }

        rule.active = !rule.active;
        info!(
            "Rule {} is now {}",
            rule_id,
            if rule.active { "active" } else { "inactive" }
        );
        Ok(rule.active)
    }

    async fn delete(&self, rule_id: &RuleId) -> Result<()> {
        self.entries
            .remove(rule_id)
            .map(|_| info!("Deleted rule {}", rule_id))
            .ok_or_else(|| DispatchError::not_found(format!("rule {}", rule_id)))
    }

    async fn advance_cursor(&self, rule_id: &RuleId, cursor: usize) -> Result<()> {
        let mut entry = self
            .entries
            .get_mut(rule_id)
            .ok_or_else(|| DispatchError::not_found(format!("rule {}", rule_id)))?;

        let len = entry.rule.agents.len();
        let clamped = if len == 0 { 0 } else { cursor % len };
        entry.rule.set_cursor(clamped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::types::RuleCriteria;

    fn store() -> InMemoryRuleStore {
        InMemoryRuleStore::new(RuleSettings::default(), 200)
    }

    fn rule(id: &str, priority: i32, agents: Vec<&str>) -> Rule {
        Rule::new(
            id,
            format!("rule {}", id),
            priority,
            RuleCriteria::new(),
            agents.into_iter().map(Into::into).collect(),
        )
    }

    #[tokio::test]
    async fn active_listing_orders_by_priority_then_creation() {
        let store = store();
        store.upsert(rule("late", 5, vec!["a1"])).await.expect("upsert");
        store.upsert(rule("first", 1, vec!["a1"])).await.expect("upsert");
        store.upsert(rule("second", 1, vec!["a1"])).await.expect("upsert");
        store
            .upsert(rule("hidden", 0, vec!["a1"]).with_active(false))
            .await
            .expect("upsert");

        let ids: Vec<String> = store
            .list_active_rules()
            .await
            .expect("list")
            .into_iter()
            .map(|r| r.id.0)
            .collect();
        assert_eq!(ids, ["first", "second", "late"]);

        let all = store.list_rules().await.expect("list");
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, "hidden".into());
    }

    #[tokio::test]
    async fn active_rule_without_agents_is_rejected() {
        let store = store();
        let err = store
            .upsert(rule("empty", 1, vec![]))
            .await
            .expect_err("upsert should fail");
        assert!(matches!(err, DispatchError::InvalidRule(_)));

        // Inactive rules may sit without a roster until activation.
        store
            .upsert(rule("empty", 1, vec![]).with_active(false))
            .await
            .expect("inactive upsert should succeed");
        let err = store
            .toggle_active(&"empty".into())
            .await
            .expect_err("activation should fail");
        assert!(matches!(err, DispatchError::InvalidRule(_)));
    }

    #[tokio::test]
    async fn duplicate_roster_entries_are_rejected() {
        let store = store();
        let err = store
            .upsert(rule("dup", 1, vec!["a1", "a1"]))
            .await
            .expect_err("upsert should fail");
        assert!(matches!(err, DispatchError::InvalidRule(_)));
    }

    #[tokio::test]
    async fn toggle_preserves_rotation_state() {
        let store = store();
        store
            .upsert(rule("r1", 1, vec!["a1", "a2", "a3"]))
            .await
            .expect("upsert");
        store.advance_cursor(&"r1".into(), 2).await.expect("advance");

        let off = store.toggle_active(&"r1".into()).await.expect("toggle");
        assert!(!off);
        let on = store.toggle_active(&"r1".into()).await.expect("toggle");
        assert!(on);

        let fetched = store.get(&"r1".into()).await.expect("get").expect("rule");
        assert_eq!(fetched.cursor(), 2);
        assert_eq!(fetched.agents.len(), 3);
    }

    #[tokio::test]
    async fn toggle_unknown_rule_is_not_found() {
        let store = store();
        let err = store
            .toggle_active(&"ghost".into())
            .await
            .expect_err("toggle should fail");
        assert!(matches!(err, DispatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_preserves_cursor_and_creation_order() {
        let store = store();
        store.upsert(rule("a", 1, vec!["a1"])).await.expect("upsert");
        store.upsert(rule("b", 1, vec!["a1", "a2"])).await.expect("upsert");
        store.advance_cursor(&"b".into(), 1).await.expect("advance");

        // Renaming keeps cursor and tie-break position.
        let mut updated = rule("b", 1, vec!["a1", "a2"]);
        updated.name = "renamed".to_string();
        store.upsert(updated).await.expect("upsert");

        let fetched = store.get(&"b".into()).await.expect("get").expect("rule");
        assert_eq!(fetched.cursor(), 1);
        assert_eq!(fetched.name, "renamed");

        let ids: Vec<String> = store
            .list_active_rules()
            .await
            .expect("list")
            .into_iter()
            .map(|r| r.id.0)
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn cursor_clamps_when_roster_shrinks() {
        let store = store();
        store
            .upsert(rule("r1", 1, vec!["a1", "a2", "a3"]))
            .await
            .expect("upsert");
        store.advance_cursor(&"r1".into(), 2).await.expect("advance");

        store
            .upsert(rule("r1", 1, vec!["a1", "a2"]))
            .await
            .expect("upsert");
        let fetched = store.get(&"r1".into()).await.expect("get").expect("rule");
        assert_eq!(fetched.cursor(), 0);
    }

    #[tokio::test]
    async fn delete_removes_rule() {
        let store = store();
        store.upsert(rule("r1", 1, vec!["a1"])).await.expect("upsert");
        store.delete(&"r1".into()).await.expect("delete");

        assert!(store.get(&"r1".into()).await.expect("get").is_none());
        let err = store
            .delete(&"r1".into())
            .await
            .expect_err("second delete should fail");
        assert!(matches!(err, DispatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn rule_limit_is_enforced() {
        let store = InMemoryRuleStore::new(RuleSettings::default(), 2);
        store.upsert(rule("r1", 1, vec!["a1"])).await.expect("upsert");
        store.upsert(rule("r2", 2, vec!["a1"])).await.expect("upsert");

        let err = store
            .upsert(rule("r3", 3, vec!["a1"]))
            .await
            .expect_err("third insert should fail");
        assert!(matches!(err, DispatchError::InvalidRule(_)));

        // Updates to existing rules are still allowed at the limit.
        store.upsert(rule("r2", 9, vec!["a1"])).await.expect("update");
    }
}
