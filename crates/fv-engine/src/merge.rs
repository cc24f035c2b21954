//! Person merging.
//!
//! Collapses duplicate person records into a single surviving primary,
//! unions their faces, and computes the people-array rewrite every
//! affected image record needs.

use tracing::debug;

use fv_models::Person;

use crate::error::{EngineError, EngineResult};

/// Outcome of merging a set of people.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The surviving person, holding the union of all candidates' faces
    pub primary: Person,
    /// Candidates absorbed into the primary, to be deleted
    pub delete_people: Vec<Person>,
    /// The full roster after the merge (deleted removed, primary
    /// updated in place)
    pub roster: Vec<Person>,
}

impl MergeOutcome {
    /// Ids of the people removed by this merge.
    pub fn deleted_ids(&self) -> Vec<&str> {
        self.delete_people.iter().map(|p| p.id.as_str()).collect()
    }
}

/// Merge the given people into one.
///
/// The primary is the candidate with the strictly greatest face count;
/// ties keep the candidate that appears first in `ids`. Ids not present
/// in the roster are ignored. An empty candidate set is a caller error.
pub fn merge_people(ids: &[String], roster: &[Person]) -> EngineResult<MergeOutcome> {
    let candidates: Vec<&Person> = ids
        .iter()
        .filter_map(|id| roster.iter().find(|p| p.id.as_str() == id))
        .collect();

    let mut selected: Option<&Person> = None;
    for candidate in candidates.iter().copied() {
        match selected {
            // Strict comparison keeps the earlier candidate on ties.
            Some(best) if candidate.faces.len() > best.faces.len() => {
                selected = Some(candidate);
            }
            None => selected = Some(candidate),
            _ => {}
        }
    }
    let selected = selected.ok_or_else(|| {
        EngineError::merge_failed("no primary person found among merge candidates")
    })?;
    let primary_id = selected.id.clone();

    // Union faces across candidates in input order; the first occurrence
    // of a face id decides which candidate's copy survives.
    let mut primary = selected.clone();
    primary.faces.clear();

    for candidate in &candidates {
        for face in &candidate.faces {
            if !primary.has_face(&face.face_id) {
                primary.faces.push(face.clone());
            }
        }
    }

    let delete_people: Vec<Person> = candidates
        .iter()
        .filter(|p| p.id != primary_id)
        .map(|p| (*p).clone())
        .collect();

    let updated_roster: Vec<Person> = roster
        .iter()
        .filter(|p| !delete_people.iter().any(|d| d.id == p.id))
        .map(|p| {
            if p.id == primary_id {
                primary.clone()
            } else {
                p.clone()
            }
        })
        .collect();

    debug!(
        primary = %primary.id,
        faces = primary.faces.len(),
        deleted = delete_people.len(),
        "Merged people"
    );

    Ok(MergeOutcome {
        primary,
        delete_people,
        roster: updated_roster,
    })
}

/// Rewrite one image's people array after a merge.
///
/// Removes every absorbed id; the primary ends up present exactly once
/// on any image that referenced the primary or one of its duplicates.
pub fn updated_people_for_image(people: &[String], outcome: &MergeOutcome) -> Vec<String> {
    let primary_id = outcome.primary.id.as_str();
    let deleted = outcome.deleted_ids();

    let referenced = people
        .iter()
        .any(|id| id == primary_id || deleted.contains(&id.as_str()));

    let mut updated: Vec<String> = people
        .iter()
        .filter(|id| id.as_str() != primary_id && !deleted.contains(&id.as_str()))
        .cloned()
        .collect();

    if referenced {
        updated.push(primary_id.to_string());
    }

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use fv_models::{FaceRef, PersonId};

    fn person(id: &str, face_ids: &[&str]) -> Person {
        let mut person = Person::from_face(
            PersonId::from_string(id),
            FaceRef::new("img", face_ids[0]),
        );
        for face_id in &face_ids[1..] {
            person.add_face(FaceRef::new("img", *face_id));
        }
        person
    }

    #[test]
    fn test_merge_unions_and_deduplicates_faces() {
        let roster = vec![person("a", &["f1", "f2"]), person("b", &["f2", "f3"])];
        let outcome =
            merge_people(&["a".to_string(), "b".to_string()], &roster).unwrap();

        let face_ids: Vec<&str> = outcome
            .primary
            .faces
            .iter()
            .map(|f| f.face_id.as_str())
            .collect();
        assert_eq!(face_ids, vec!["f1", "f2", "f3"]);
    }

    #[test]
    fn test_primary_is_largest_face_count() {
        let roster = vec![person("small", &["f1"]), person("big", &["f2", "f3"])];
        let outcome =
            merge_people(&["small".to_string(), "big".to_string()], &roster).unwrap();

        assert_eq!(outcome.primary.id.as_str(), "big");
        assert_eq!(outcome.delete_people.len(), 1);
        assert_eq!(outcome.delete_people[0].id.as_str(), "small");
    }

    #[test]
    fn test_tie_break_prefers_first_input_id() {
        // Equal face counts: input order decides, roster order does not.
        let roster = vec![person("x", &["f1"]), person("y", &["f2"])];

        let outcome = merge_people(&["y".to_string(), "x".to_string()], &roster).unwrap();
        assert_eq!(outcome.primary.id.as_str(), "y");

        let outcome = merge_people(&["x".to_string(), "y".to_string()], &roster).unwrap();
        assert_eq!(outcome.primary.id.as_str(), "x");
    }

    #[test]
    fn test_merge_updates_roster_in_place() {
        let roster = vec![
            person("a", &["f1"]),
            person("unrelated", &["f9"]),
            person("b", &["f2", "f3"]),
        ];
        let outcome =
            merge_people(&["a".to_string(), "b".to_string()], &roster).unwrap();

        let ids: Vec<&str> = outcome.roster.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["unrelated", "b"]);
        // Primary in the roster carries the merged face set
        assert_eq!(outcome.roster[1].faces.len(), 3);
    }

    #[test]
    fn test_merge_empty_candidates_fails() {
        let roster = vec![person("a", &["f1"])];
        let result = merge_people(&["missing".to_string()], &roster);
        assert!(matches!(result, Err(EngineError::MergeFailed(_))));
    }

    #[test]
    fn test_image_update_replaces_deleted_with_primary() {
        let roster = vec![person("keep", &["f1", "f2"]), person("drop", &["f3"])];
        let outcome =
            merge_people(&["keep".to_string(), "drop".to_string()], &roster).unwrap();

        // Image referenced only the duplicate: gains the primary
        let updated = updated_people_for_image(
            &["drop".to_string(), "other".to_string()],
            &outcome,
        );
        assert_eq!(updated, vec!["other".to_string(), "keep".to_string()]);

        // Image referenced both: primary appears exactly once
        let updated = updated_people_for_image(
            &["drop".to_string(), "keep".to_string()],
            &outcome,
        );
        assert_eq!(updated, vec!["keep".to_string()]);

        // Image referenced neither: untouched
        let updated = updated_people_for_image(&["other".to_string()], &outcome);
        assert_eq!(updated, vec!["other".to_string()]);
    }
}
