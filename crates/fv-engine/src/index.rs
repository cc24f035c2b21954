//! Tag/people counter maintenance.
//!
//! Turns a batch of image change records into signed per-key deltas and
//! folds them into the persisted counters. Counters clamp at zero and
//! zero-valued keys are retained, which keeps the fold idempotent-safe
//! under missed or redelivered events.

use std::collections::{HashMap, HashSet};

use fv_models::{ChangeRecord, ImageFacets, IndexCounts};

/// Signed count deltas for one batch of change records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDeltas {
    pub tags: HashMap<String, i64>,
    pub people: HashMap<String, i64>,
}

impl IndexDeltas {
    /// True if the batch produced no net change.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.people.is_empty()
    }
}

/// Compute per-key deltas for a batch of change records.
///
/// For each record and each facet independently: an item present only
/// in the new snapshot contributes +1, only in the old snapshot −1,
/// and in both (or neither) 0. Deltas accumulate across the batch.
pub fn parse_index_deltas(records: &[ChangeRecord]) -> IndexDeltas {
    let empty = ImageFacets::default();
    let mut deltas = IndexDeltas::default();

    for record in records {
        let old = record.old.as_ref().unwrap_or(&empty);
        let new = record.new.as_ref().unwrap_or(&empty);

        accumulate_field(&mut deltas.tags, &old.tags, &new.tags);
        accumulate_field(&mut deltas.people, &old.people, &new.people);
    }

    deltas
}

fn accumulate_field(deltas: &mut HashMap<String, i64>, old: &[String], new: &[String]) {
    let old_set: HashSet<&str> = old.iter().map(String::as_str).collect();
    let new_set: HashSet<&str> = new.iter().map(String::as_str).collect();

    for added in new_set.difference(&old_set) {
        *deltas.entry((*added).to_string()).or_insert(0) += 1;
    }
    for removed in old_set.difference(&new_set) {
        *deltas.entry((*removed).to_string()).or_insert(0) -= 1;
    }
}

/// Fold a batch of deltas into the existing counters.
///
/// Each touched key becomes `max(0, existing + delta)`; untouched keys
/// are carried over unchanged. The zero floor absorbs deletions that
/// outpace known insertions (missed events) instead of going negative.
pub fn update_counts(existing: &IndexCounts, deltas: &IndexDeltas) -> IndexCounts {
    IndexCounts {
        tags: fold_field(&existing.tags, &deltas.tags),
        people: fold_field(&existing.people, &deltas.people),
    }
}

fn fold_field(existing: &HashMap<String, i64>, deltas: &HashMap<String, i64>) -> HashMap<String, i64> {
    let mut updated = existing.clone();
    for (key, delta) in deltas {
        let count = updated.entry(key.clone()).or_insert(0);
        *count = (*count + delta).max(0);
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use fv_models::ChangeRecord;

    fn facets(tags: &[&str], people: &[&str]) -> ImageFacets {
        ImageFacets::new(
            tags.iter().map(|s| s.to_string()).collect(),
            people.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_insert_adds_one_per_item() {
        let records = vec![ChangeRecord::insert(facets(&["a", "b"], &["p1"]))];
        let deltas = parse_index_deltas(&records);

        assert_eq!(deltas.tags.get("a"), Some(&1));
        assert_eq!(deltas.tags.get("b"), Some(&1));
        assert_eq!(deltas.people.get("p1"), Some(&1));
    }

    #[test]
    fn test_remove_subtracts_one_per_item() {
        let records = vec![ChangeRecord::remove(facets(&["a"], &["p1", "p2"]))];
        let deltas = parse_index_deltas(&records);

        assert_eq!(deltas.tags.get("a"), Some(&-1));
        assert_eq!(deltas.people.get("p1"), Some(&-1));
        assert_eq!(deltas.people.get("p2"), Some(&-1));
    }

    #[test]
    fn test_modify_counts_only_differences() {
        let records = vec![ChangeRecord::modify(
            facets(&["keep", "drop"], &[]),
            facets(&["keep", "add"], &[]),
        )];
        let deltas = parse_index_deltas(&records);

        assert_eq!(deltas.tags.get("keep"), None);
        assert_eq!(deltas.tags.get("drop"), Some(&-1));
        assert_eq!(deltas.tags.get("add"), Some(&1));
    }

    #[test]
    fn test_insert_then_remove_nets_zero() {
        let records = vec![
            ChangeRecord::insert(facets(&["a", "b"], &[])),
            ChangeRecord::remove(facets(&["a", "b"], &[])),
        ];
        let deltas = parse_index_deltas(&records);

        assert_eq!(deltas.tags.get("a"), Some(&0));
        assert_eq!(deltas.tags.get("b"), Some(&0));
    }

    #[test]
    fn test_update_counts_floors_at_zero() {
        let mut existing = IndexCounts::new();
        existing.tags.insert("x".to_string(), 1);

        let mut deltas = IndexDeltas::default();
        deltas.tags.insert("x".to_string(), -5);

        let updated = update_counts(&existing, &deltas);
        assert_eq!(updated.tags.get("x"), Some(&0));
    }

    #[test]
    fn test_update_counts_keeps_untouched_keys() {
        let mut existing = IndexCounts::new();
        existing.tags.insert("old".to_string(), 7);
        existing.people.insert("p".to_string(), 0);

        let mut deltas = IndexDeltas::default();
        deltas.tags.insert("new".to_string(), 2);

        let updated = update_counts(&existing, &deltas);
        assert_eq!(updated.tags.get("old"), Some(&7));
        assert_eq!(updated.tags.get("new"), Some(&2));
        // Zero-valued audit entries persist
        assert_eq!(updated.people.get("p"), Some(&0));
    }

    #[test]
    fn test_new_key_negative_delta_floors_at_zero() {
        let existing = IndexCounts::new();
        let mut deltas = IndexDeltas::default();
        deltas.people.insert("ghost".to_string(), -3);

        let updated = update_counts(&existing, &deltas);
        assert_eq!(updated.people.get("ghost"), Some(&0));
    }
}
