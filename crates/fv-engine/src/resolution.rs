//! Person resolution for newly detected faces.
//!
//! Given an image's detected faces and their similarity hits against
//! the face corpus, decide which faces belong to existing roster people
//! and which seed new people, and produce the updated roster plus the
//! image record's people list.

use tracing::debug;

use fv_models::{
    DetectedFace, FaceMatch, FaceRef, FaceWithPeople, ImageDimensions, Person, PersonId,
};

use crate::geometry::person_thumbnail_key;
use crate::matching::{is_match, match_against_roster};

/// One detected face plus its raw similarity hits from the vision service.
#[derive(Debug, Clone)]
pub struct FaceCandidate {
    pub face: DetectedFace,
    pub matches: Vec<FaceMatch>,
}

impl FaceCandidate {
    pub fn new(face: DetectedFace, matches: Vec<FaceMatch>) -> Self {
        Self { face, matches }
    }
}

/// Outcome of resolving one image's faces against the roster.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Every detected face with its per-person aggregate scores
    pub faces: Vec<FaceWithPeople>,
    /// People created for faces no existing person claimed
    pub new_people: Vec<Person>,
    /// The full roster after this resolution (existing people updated,
    /// new people appended)
    pub roster: Vec<Person>,
    /// Person ids to write onto the image record, deduplicated
    pub image_people: Vec<String>,
}

/// Resolve an image's faces against the people roster.
///
/// Pure with respect to its inputs; the caller owns the similarity
/// search fan-out and all persistence.
pub fn resolve_people(
    candidates: &[FaceCandidate],
    roster: &[Person],
    image_dimensions: Option<ImageDimensions>,
    img_key: &str,
    user_identity_id: &str,
) -> Resolution {
    let mut faces = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let people = match_against_roster(roster, &candidate.matches);
        faces.push(FaceWithPeople {
            face_id: candidate.face.face_id.clone(),
            external_image_id: candidate.face.external_image_id.clone(),
            bounding_box: Some(candidate.face.bounding_box),
            image_dimensions,
            people,
            img_key: Some(img_key.to_string()),
            user_identity_id: Some(user_identity_id.to_string()),
        });
    }

    let mut updated_roster: Vec<Person> = roster.to_vec();
    let mut new_people = Vec::new();
    let mut image_people: Vec<String> = Vec::new();

    for face in &faces {
        let matched: Vec<&str> = face
            .people
            .iter()
            .filter(|m| is_match(m.similarity))
            .map(|m| m.person_id.as_str())
            .collect();

        if matched.is_empty() {
            // No existing person claimed this face: seed a new one.
            let id = PersonId::new();
            let mut person = Person::from_face(
                id.clone(),
                FaceRef::new(face.external_image_id.clone(), face.face_id.clone()),
            )
            .with_thumbnail(person_thumbnail_key(user_identity_id, id.as_str()))
            .with_img_key(img_key)
            .with_user_identity_id(user_identity_id);

            if let Some(bounding_box) = face.bounding_box {
                person = person.with_bounding_box(bounding_box);
            }
            if let Some(dims) = image_dimensions {
                person = person.with_image_dimensions(dims);
            }

            debug!(person_id = %id, face_id = %face.face_id, "Creating new person for unmatched face");
            image_people.push(id.as_str().to_string());
            new_people.push(person);
        } else {
            for person_id in matched {
                if let Some(person) = updated_roster.iter_mut().find(|p| p.id.as_str() == person_id)
                {
                    person.add_face(FaceRef::new(
                        face.external_image_id.clone(),
                        face.face_id.clone(),
                    ));
                }
                if !image_people.iter().any(|id| id == person_id) {
                    image_people.push(person_id.to_string());
                }
            }
        }
    }

    updated_roster.extend(new_people.iter().cloned());

    Resolution {
        faces,
        new_people,
        roster: updated_roster,
        image_people,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fv_models::BoundingBox;

    fn detected(face_id: &str) -> DetectedFace {
        DetectedFace {
            face_id: face_id.to_string(),
            external_image_id: "ext-img".to_string(),
            bounding_box: BoundingBox::new(0.1, 0.1, 0.2, 0.2),
            landmarks: Vec::new(),
        }
    }

    fn roster_person(id: &str, face_id: &str) -> Person {
        Person::from_face(PersonId::from_string(id), FaceRef::new("other-img", face_id))
    }

    #[test]
    fn test_matched_face_joins_existing_person() {
        let roster = vec![roster_person("p1", "known-face")];
        let candidates = vec![FaceCandidate::new(
            detected("new-face"),
            vec![FaceMatch::new("known-face", 92.0)],
        )];

        let resolution = resolve_people(&candidates, &roster, None, "key", "identity");

        assert!(resolution.new_people.is_empty());
        assert_eq!(resolution.image_people, vec!["p1".to_string()]);
        assert_eq!(resolution.roster.len(), 1);
        assert!(resolution.roster[0].has_face("new-face"));
    }

    #[test]
    fn test_unmatched_face_creates_new_person() {
        let roster = vec![roster_person("p1", "known-face")];
        let candidates = vec![FaceCandidate::new(
            detected("stranger"),
            vec![FaceMatch::new("known-face", 40.0)],
        )];

        let resolution = resolve_people(&candidates, &roster, None, "key", "identity");

        assert_eq!(resolution.new_people.len(), 1);
        let new_person = &resolution.new_people[0];
        assert_eq!(new_person.faces.len(), 1);
        assert_eq!(new_person.faces[0].face_id, "stranger");
        assert!(new_person.name.is_empty());
        assert_eq!(
            new_person.thumbnail.as_deref(),
            Some(format!("identity/faces/{}.jpg", new_person.id).as_str())
        );

        // Roster grows, image references only the new person
        assert_eq!(resolution.roster.len(), 2);
        assert_eq!(resolution.image_people, vec![new_person.id.to_string()]);
    }

    #[test]
    fn test_empty_roster_creates_person_per_face() {
        let candidates = vec![
            FaceCandidate::new(detected("f1"), vec![]),
            FaceCandidate::new(detected("f2"), vec![]),
        ];

        let resolution = resolve_people(&candidates, &[], None, "key", "identity");
        assert_eq!(resolution.new_people.len(), 2);
        assert_eq!(resolution.roster.len(), 2);
        assert_eq!(resolution.image_people.len(), 2);
    }

    #[test]
    fn test_duplicate_face_not_readded() {
        let roster = vec![roster_person("p1", "f1")];
        // The probe face is already stored on p1
        let candidates = vec![FaceCandidate::new(
            DetectedFace {
                face_id: "f1".to_string(),
                external_image_id: "ext-img".to_string(),
                bounding_box: BoundingBox::new(0.1, 0.1, 0.2, 0.2),
                landmarks: Vec::new(),
            },
            vec![FaceMatch::new("f1", 99.0)],
        )];

        let resolution = resolve_people(&candidates, &roster, None, "key", "identity");
        assert_eq!(resolution.roster[0].faces.len(), 1);
    }

    #[test]
    fn test_image_people_deduplicated() {
        // Two faces both matching the same person must yield one id.
        let mut p = roster_person("p1", "f1");
        p.add_face(FaceRef::new("other-img", "f2"));
        let roster = vec![p];

        let candidates = vec![
            FaceCandidate::new(
                detected("a"),
                vec![FaceMatch::new("f1", 95.0), FaceMatch::new("f2", 95.0)],
            ),
            FaceCandidate::new(
                detected("b"),
                vec![FaceMatch::new("f1", 90.0), FaceMatch::new("f2", 90.0)],
            ),
        ];

        let resolution = resolve_people(&candidates, &roster, None, "key", "identity");
        assert_eq!(resolution.image_people, vec!["p1".to_string()]);
    }

    #[test]
    fn test_faces_carry_roster_scores() {
        let roster = vec![roster_person("p1", "f1"), roster_person("p2", "f2")];
        let candidates = vec![FaceCandidate::new(
            detected("probe"),
            vec![FaceMatch::new("f2", 85.0)],
        )];

        let resolution = resolve_people(&candidates, &roster, None, "key", "identity");
        let face = &resolution.faces[0];
        assert_eq!(face.people.len(), 2);
        assert_eq!(face.people[0].person_id, "p1");
        assert_eq!(face.people[0].similarity, 0.0);
        assert_eq!(face.people[1].similarity, 85.0);
    }
}
