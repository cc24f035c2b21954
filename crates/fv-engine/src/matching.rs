//! Aggregate face/person similarity scoring.

use fv_models::{FaceMatch, Person, PersonMatch};

/// Minimum aggregate similarity (percent) for a face to belong to a person.
pub const MATCH_THRESHOLD: f64 = 80.0;

/// True if a similarity score clears the match threshold.
pub fn is_match(similarity: f64) -> bool {
    similarity >= MATCH_THRESHOLD
}

/// Mean similarity of a probe face against all of a person's known faces.
///
/// Every stored face counts toward the mean: a face absent from the
/// match set scores 0 and pulls the average down, so a person with many
/// unmatched faces needs strong hits to clear the threshold. A person
/// with no faces scores 0 rather than dividing by zero.
pub fn aggregate_similarity(person: &Person, face_matches: &[FaceMatch]) -> f64 {
    if person.faces.is_empty() {
        return 0.0;
    }

    let total: f64 = person
        .faces
        .iter()
        .map(|face| {
            face_matches
                .iter()
                .find(|m| m.face_id == face.face_id)
                .map(|m| m.similarity)
                .unwrap_or(0.0)
        })
        .sum();

    total / person.faces.len() as f64
}

/// Score a probe face against every roster person, in roster order.
pub fn match_against_roster(roster: &[Person], face_matches: &[FaceMatch]) -> Vec<PersonMatch> {
    roster
        .iter()
        .map(|person| {
            PersonMatch::new(
                person.id.as_str(),
                aggregate_similarity(person, face_matches),
            )
        })
        .collect()
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
    fn test_aggregate_similarity_mean() {
        let p = person("p1", &["f1", "f2"]);
        let matches = vec![FaceMatch::new("f1", 90.0), FaceMatch::new("f2", 70.0)];
        assert_eq!(aggregate_similarity(&p, &matches), 80.0);
    }

    #[test]
    fn test_unmatched_faces_count_as_zero() {
        let p = person("p1", &["f1", "f2", "f3"]);
        let matches = vec![FaceMatch::new("f1", 90.0)];
        assert_eq!(aggregate_similarity(&p, &matches), 30.0);
    }

    #[test]
    fn test_zero_face_person_scores_zero() {
        let mut p = person("p1", &["f1"]);
        p.faces.clear();
        let matches = vec![FaceMatch::new("f1", 99.0)];
        assert_eq!(aggregate_similarity(&p, &matches), 0.0);
    }

    #[test]
    fn test_match_against_roster_preserves_order() {
        let roster = vec![person("p1", &["f1"]), person("p2", &["f2"])];
        let matches = vec![FaceMatch::new("f2", 95.0)];

        let result = match_against_roster(&roster, &matches);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].person_id, "p1");
        assert_eq!(result[0].similarity, 0.0);
        assert_eq!(result[1].person_id, "p2");
        assert_eq!(result[1].similarity, 95.0);
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(is_match(80.0));
        assert!(is_match(80.1));
        assert!(!is_match(79.999));
    }
}
