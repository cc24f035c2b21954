//! Query criteria for browsing images.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Inclusive numeric time window (epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange {
    pub from: i64,
    pub to: i64,
}

impl DateRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }
}

/// Client-supplied filter criteria for an image query.
///
/// All fields are optional; a criteria object with no non-empty array
/// means "everything in range". `last_retrieved_birthtime` is a
/// pagination continuation cursor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QueryCriteria {
    /// Match images carrying any of these tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Match images associated with any of these person ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<String>>,

    /// Truncate results to this many items when positive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,

    /// Birthtime of the last item the client already holds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_retrieved_birthtime: Option<i64>,
}

impl QueryCriteria {
    /// Criteria matching everything (no filtering, no limit).
    pub fn any() -> Self {
        Self::default()
    }

    /// Filter by tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Filter by people.
    pub fn with_people(mut self, people: Vec<String>) -> Self {
        self.people = Some(people);
        self
    }

    /// Limit the result count.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_builder() {
        let criteria = QueryCriteria::any()
            .with_tags(vec!["trees".into()])
            .with_limit(10);

        assert_eq!(criteria.tags.as_deref(), Some(&["trees".to_string()][..]));
        assert_eq!(criteria.limit, Some(10));
        assert!(criteria.people.is_none());
    }
}
