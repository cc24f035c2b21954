//! Tag/people index counters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted tag and people counters for one group.
///
/// Each value counts the images currently carrying that tag or person.
/// Counts are clamped at zero and entries are never pruned: a key that
/// drops to zero stays in the map as an audit record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndexCounts {
    /// Tag name -> image count
    #[serde(default)]
    pub tags: HashMap<String, i64>,

    /// Person id -> image count
    #[serde(default)]
    pub people: HashMap<String, i64>,
}

impl IndexCounts {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tracked keys across both maps.
    pub fn len(&self) -> usize {
        self.tags.len() + self.people.len()
    }

    /// True if no keys are tracked yet.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.people.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        let index = IndexCounts::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_index_roundtrip() {
        let mut index = IndexCounts::new();
        index.tags.insert("trees".to_string(), 3);
        index.people.insert("person-1".to_string(), 0);

        let json = serde_json::to_string(&index).unwrap();
        let back: IndexCounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
        // Zero-valued entries survive the roundtrip
        assert_eq!(back.people.get("person-1"), Some(&0));
    }
}
