//! Routing rule and lead types

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::agent::types::AgentId;

/// Rule identifier type for strongly-typed rule references
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    /// Generate a fresh rule id
    pub fn new() -> Self {
        RuleId(format!("rule-{}", uuid::Uuid::new_v4()))
    }
}

impl From<String> for RuleId {
    fn from(s: String) -> Self {
        RuleId(s)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        RuleId(s.to_string())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Attribute axis a rule can restrict on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    University,
    Stream,
    Degree,
    Specialization,
    Level,
    CourseName,
    Source,
}

impl Dimension {
    /// Every dimension, in display order
    pub const ALL: [Dimension; 7] = [
        Dimension::University,
        Dimension::Stream,
        Dimension::Degree,
        Dimension::Specialization,
        Dimension::Level,
        Dimension::CourseName,
        Dimension::Source,
    ];
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "university" | "University" => Ok(Dimension::University),
            "stream" | "Stream" => Ok(Dimension::Stream),
            "degree" | "Degree" => Ok(Dimension::Degree),
            "specialization" | "Specialization" => Ok(Dimension::Specialization),
            "level" | "Level" => Ok(Dimension::Level),
            "courseName" | "coursename" | "CourseName" => Ok(Dimension::CourseName),
            "source" | "Source" => Ok(Dimension::Source),
            _ => Err(format!("Unknown dimension: {}", s)),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::University => write!(f, "university"),
            Dimension::Stream => write!(f, "stream"),
            Dimension::Degree => write!(f, "degree"),
            Dimension::Specialization => write!(f, "specialization"),
            Dimension::Level => write!(f, "level"),
            Dimension::CourseName => write!(f, "courseName"),
            Dimension::Source => write!(f, "source"),
        }
    }
}

/// Per-dimension accepted value sets
///
/// An empty set, or a dimension that is absent entirely, is a wildcard
/// and matches any lead value on that axis. `HashSet` keeps the sets
/// duplicate-free by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCriteria {
    dimensions: HashMap<Dimension, HashSet<String>>,
}

impl RuleCriteria {
    /// Criteria with no restrictions: matches every lead
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted values for a dimension
    pub fn with_values<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions
            .insert(dimension, values.into_iter().map(Into::into).collect());
        self
    }

    /// Add a single accepted value for a dimension
    pub fn allow(&mut self, dimension: Dimension, value: impl Into<String>) {
        self.dimensions
            .entry(dimension)
            .or_default()
            .insert(value.into());
    }

    /// Accepted values for a dimension, `None` when unrestricted
    pub fn values(&self, dimension: Dimension) -> Option<&HashSet<String>> {
        self.dimensions.get(&dimension)
    }

    /// True when the dimension places no restriction on leads
    pub fn is_wildcard(&self, dimension: Dimension) -> bool {
        self.dimensions
            .get(&dimension)
            .map(|values| values.is_empty())
            .unwrap_or(true)
    }

    /// True when a lead carrying `lead_values` on this dimension passes it
    ///
    /// Wildcard dimensions pass everything; restricted dimensions pass
    /// when any lead value is in the accepted set, so a lead with no
    /// value on a restricted dimension fails it.
    pub fn accepts(&self, dimension: Dimension, lead_values: &[String]) -> bool {
        match self.dimensions.get(&dimension) {
            None => true,
            Some(accepted) if accepted.is_empty() => true,
            Some(accepted) => lead_values.iter().any(|value| accepted.contains(value)),
        }
    }

    /// Iterate over all configured dimensions and their value sets
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &HashSet<String>)> {
        self.dimensions.iter().map(|(dim, values)| (*dim, values))
    }

    /// True when no dimension is configured at all
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

/// A lead's routing-relevant attributes
///
/// Input value only; the engine never stores leads. The `reference` is an
/// opaque caller-side identifier carried through to the assignment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Caller-side lead identifier
    pub reference: String,

    /// Values per dimension; a dimension may carry several values
    attributes: HashMap<Dimension, Vec<String>>,
}

impl Lead {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add one value on a dimension
    pub fn with_value(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.attributes
            .entry(dimension)
            .or_default()
            .push(value.into());
        self
    }

    /// Add several values on a dimension
    pub fn with_values<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(dimension)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// The lead's values on a dimension, empty when it carries none
    pub fn values(&self, dimension: Dimension) -> &[String] {
        self.attributes
            .get(&dimension)
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }
}

/// A routing rule: criteria plus an ordered agent roster
///
/// `cursor` is rotation state owned by the engine; administrators never
/// set it. It is kept private and moved only through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule identifier
    pub id: RuleId,

    /// Display label, not used for matching
    pub name: String,

    /// Evaluation order: lower runs first, ties broken by creation order
    pub priority: i32,

    /// Inactive rules are never matched
    pub active: bool,

    /// Accepted values per dimension
    pub criteria: RuleCriteria,

    /// Ordered agent roster; order defines the rotation sequence
    pub agents: Vec<AgentId>,

    /// Index into `agents` of the next rotation turn
    #[serde(default)]
    cursor: usize,
}

impl Rule {
    /// Create an active rule with the cursor at the start of the roster
    pub fn new(
        id: impl Into<RuleId>,
        name: impl Into<String>,
        priority: i32,
        criteria: RuleCriteria,
        agents: Vec<AgentId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            active: true,
            criteria,
            agents,
            cursor: 0,
        }
    }

    /// Set the active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Whose turn is next in the roster
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_strings_round_trip() {
        for dimension in Dimension::ALL {
            let parsed: Dimension = dimension.to_string().parse().expect("should parse");
            assert_eq!(parsed, dimension);
        }
        assert_eq!(Dimension::CourseName.to_string(), "courseName");
        assert!("campus".parse::<Dimension>().is_err());
    }

    #[test]
    fn absent_and_empty_dimensions_are_wildcards() {
        let criteria = RuleCriteria::new().with_values(Dimension::Source, Vec::<String>::new());

        assert!(criteria.is_wildcard(Dimension::Source));
        assert!(criteria.is_wildcard(Dimension::Stream));
        assert!(criteria.accepts(Dimension::Source, &["anything".to_string()]));
        assert!(criteria.accepts(Dimension::Stream, &[]));
    }

    #[test]
    fn restricted_dimension_requires_intersection() {
        let criteria =
            RuleCriteria::new().with_values(Dimension::Source, ["Website", "Referral"]);

        assert!(criteria.accepts(Dimension::Source, &["Website".to_string()]));
        assert!(!criteria.accepts(Dimension::Source, &["Walk-in".to_string()]));
        // A lead with no value on a restricted dimension fails it.
        assert!(!criteria.accepts(Dimension::Source, &[]));
    }

    #[test]
    fn criteria_sets_deduplicate_values() {
        let mut criteria = RuleCriteria::new();
        criteria.allow(Dimension::Level, "UG");
        criteria.allow(Dimension::Level, "UG");

        assert_eq!(criteria.values(Dimension::Level).map(|v| v.len()), Some(1));
    }

    #[test]
    fn lead_values_default_to_empty() {
        let lead = Lead::new("lead-42").with_value(Dimension::Source, "Website");

        assert_eq!(lead.values(Dimension::Source), ["Website".to_string()]);
        assert!(lead.values(Dimension::Degree).is_empty());
    }

    #[test]
    fn new_rule_starts_at_cursor_zero() {
        let rule = Rule::new(
            "r1",
            "Default",
            10,
            RuleCriteria::new(),
            vec!["a1".into(), "a2".into()],
        );
        assert_eq!(rule.cursor(), 0);
        assert!(rule.active);
    }
}
