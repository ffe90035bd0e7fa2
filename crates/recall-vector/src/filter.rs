//! Metadata filters applied alongside similarity ranking.
//!
//! A [`MetadataFilter`] is a conjunction: an entry matches only if every
//! condition holds. A condition on a key the entry does not have never holds.
//! An empty filter matches everything, but callers should represent "no
//! filter" as `None` rather than an empty filter.

use serde::{Deserialize, Serialize};

use crate::types::{Metadata, MetadataValue};

/// A single condition on one metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCondition {
    /// Value equals the given value.
    Eq(MetadataValue),
    /// Value equals one of the given values.
    In(Vec<MetadataValue>),
    /// Value is greater than or equal to the bound.
    Gte(MetadataValue),
    /// Value is less than or equal to the bound.
    Lte(MetadataValue),
}

impl FilterCondition {
    /// Check whether a value satisfies this condition.
    pub fn holds(&self, value: &MetadataValue) -> bool {
        match self {
            FilterCondition::Eq(expected) => value == expected,
            FilterCondition::In(allowed) => allowed.iter().any(|a| a == value),
            FilterCondition::Gte(bound) => value >= bound,
            FilterCondition::Lte(bound) => value <= bound,
        }
    }
}

/// AND of conditions over metadata keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    conditions: Vec<(String, FilterCondition)>,
}

impl MetadataFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an exact-equality filter from key-value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        Self {
            conditions: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), FilterCondition::Eq(v.into())))
                .collect(),
        }
    }

    /// Add an arbitrary condition.
    pub fn with(mut self, key: impl Into<String>, condition: FilterCondition) -> Self {
        self.conditions.push((key.into(), condition));
        self
    }

    /// Add an equality condition.
    pub fn equals(self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.with(key, FilterCondition::Eq(value.into()))
    }

    /// Check whether the metadata satisfies every condition.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions.iter().all(|(key, condition)| {
            metadata
                .get(key)
                .map(|value| condition.holds(value))
                .unwrap_or(false)
        })
    }

    /// The conditions, in insertion order.
    pub fn conditions(&self) -> &[(String, FilterCondition)] {
        &self.conditions
    }

    /// Returns true if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn note(category: &str, date: &str) -> Metadata {
        Metadata::from_pairs([
            ("category", MetadataValue::from(category)),
            ("date", MetadataValue::from(date)),
        ])
    }

    #[rstest]
    #[case("notes", true)]
    #[case("recipes", false)]
    fn test_equality_filter(#[case] category: &str, #[case] expected: bool) {
        let filter = MetadataFilter::from_pairs([("category", "notes")]);
        assert_eq!(filter.matches(&note(category, "2024-01-01")), expected);
    }

    #[test]
    fn test_all_keys_must_match() {
        let filter = MetadataFilter::new()
            .equals("category", "notes")
            .equals("date", "2024-01-01");
        assert!(filter.matches(&note("notes", "2024-01-01")));
        assert!(!filter.matches(&note("notes", "2024-01-02")));
    }

    #[test]
    fn test_missing_key_does_not_match() {
        let filter = MetadataFilter::new().equals("author", "me");
        assert!(!filter.matches(&note("notes", "2024-01-01")));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(MetadataFilter::new().matches(&Metadata::new()));
    }

    #[test]
    fn test_in_and_range_conditions() {
        let filter = MetadataFilter::new()
            .with(
                "category",
                FilterCondition::In(vec!["notes".into(), "journal".into()]),
            )
            .with("date", FilterCondition::Gte("2024-03-01".into()))
            .with("date", FilterCondition::Lte("2024-03-31".into()));

        assert!(filter.matches(&note("journal", "2024-03-15")));
        assert!(!filter.matches(&note("recipes", "2024-03-15")));
        assert!(!filter.matches(&note("notes", "2024-04-01")));
        assert!(!filter.matches(&note("notes", "2024-02-29")));
    }
}
