//! Rule matching
//!
//! First-match policy: rules are evaluated in `(priority, creation
//! order)` and the first one whose criteria pass wins. Within a rule,
//! dimensions combine with AND and a dimension's accepted values combine
//! with OR. There is no specificity inference; administrators order
//! overlapping rules through `priority`.

use crate::rules::types::{Lead, Rule};

/// True when every non-wildcard dimension of the rule intersects the
/// lead's values on that dimension
pub fn rule_matches(rule: &Rule, lead: &Lead) -> bool {
    rule.criteria
        .iter()
        .all(|(dimension, _)| rule.criteria.accepts(dimension, lead.values(dimension)))
}

/// First rule in the given order that matches the lead
///
/// Callers pass the ordered active listing from the store; this function
/// does not re-sort or filter on the active flag.
pub fn find_matching_rule<'a>(rules: &'a [Rule], lead: &Lead) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule_matches(rule, lead))
}
