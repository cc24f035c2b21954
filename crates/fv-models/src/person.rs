//! People roster models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::geometry::{BoundingBox, ImageDimensions};

/// Unique identifier for a person (face cluster).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    /// Generate a new random person ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PersonId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to one indexed face belonging to a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FaceRef {
    /// External image ID the face was indexed under
    pub external_image_id: String,
    /// Native face ID from the vision service
    pub face_id: String,
}

impl FaceRef {
    /// Create a new face reference.
    pub fn new(external_image_id: impl Into<String>, face_id: impl Into<String>) -> Self {
        Self {
            external_image_id: external_image_id.into(),
            face_id: face_id.into(),
        }
    }
}

/// A clustering of faces believed to be the same individual.
///
/// Faces within one person are unique by `face_id`. A person is created
/// when a detected face matches no existing person above the similarity
/// threshold, and removed when a merge absorbs it or when no image
/// references it any longer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    /// Unique person ID, assigned at first detection
    pub id: PersonId,

    /// User-editable display name, empty until the user names the person
    #[serde(default)]
    pub name: String,

    /// Faces belonging to this person, unique by face id
    #[serde(default)]
    pub faces: Vec<FaceRef>,

    /// Bounding box of the key face, from the originating detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Dimensions of the source image at creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,

    /// Blob-store key of the cropped face thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Cloud identity of the owning user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identity_id: Option<String>,

    /// Blob-store key of the source image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_key: Option<String>,
}

impl Person {
    /// Create a new unnamed person seeded with a single face.
    pub fn from_face(id: PersonId, face: FaceRef) -> Self {
        Self {
            id,
            name: String::new(),
            faces: vec![face],
            bounding_box: None,
            image_dimensions: None,
            thumbnail: None,
            user_identity_id: None,
            img_key: None,
        }
    }

    /// Set the key-face bounding box.
    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// Set the source-image dimensions.
    pub fn with_image_dimensions(mut self, dims: ImageDimensions) -> Self {
        self.image_dimensions = Some(dims);
        self
    }

    /// Set the thumbnail key.
    pub fn with_thumbnail(mut self, key: impl Into<String>) -> Self {
        self.thumbnail = Some(key.into());
        self
    }

    /// Set the source image key.
    pub fn with_img_key(mut self, key: impl Into<String>) -> Self {
        self.img_key = Some(key.into());
        self
    }

    /// Set the owning identity.
    pub fn with_user_identity_id(mut self, id: impl Into<String>) -> Self {
        self.user_identity_id = Some(id.into());
        self
    }

    /// True if this person already holds the given face id.
    pub fn has_face(&self, face_id: &str) -> bool {
        self.faces.iter().any(|f| f.face_id == face_id)
    }

    /// Append a face unless a face with the same id is already present.
    pub fn add_face(&mut self, face: FaceRef) {
        if !self.has_face(&face.face_id) {
            self.faces.push(face);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_id_generation() {
        assert_ne!(PersonId::new(), PersonId::new());
    }

    #[test]
    fn test_add_face_deduplicates() {
        let mut person = Person::from_face(PersonId::new(), FaceRef::new("img-1", "face-1"));
        person.add_face(FaceRef::new("img-2", "face-2"));
        person.add_face(FaceRef::new("img-3", "face-1"));

        assert_eq!(person.faces.len(), 2);
        assert!(person.has_face("face-1"));
        assert!(person.has_face("face-2"));
    }

    #[test]
    fn test_person_defaults() {
        let person = Person::from_face(PersonId::new(), FaceRef::new("img", "face"));
        assert!(person.name.is_empty());
        assert!(person.thumbnail.is_none());
    }
}
