//! Transient face-matching models.
//!
//! These types only live for the duration of one person-resolution pass;
//! they are embedded into records as `face_matches` metadata for
//! traceability but are never the source of truth.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, ImageDimensions};

/// One similarity hit returned by the vision service for a probe face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceMatch {
    /// Face ID of the matched corpus face
    pub face_id: String,
    /// Similarity score in percent (0.0 to 100.0)
    pub similarity: f64,
}

impl FaceMatch {
    pub fn new(face_id: impl Into<String>, similarity: f64) -> Self {
        Self {
            face_id: face_id.into(),
            similarity,
        }
    }
}

/// Aggregate similarity of a probe face against one roster person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonMatch {
    /// Roster person id
    pub person_id: String,
    /// Mean similarity over all of the person's known faces
    pub similarity: f64,
}

impl PersonMatch {
    pub fn new(person_id: impl Into<String>, similarity: f64) -> Self {
        Self {
            person_id: person_id.into(),
            similarity,
        }
    }
}

/// A detected face annotated with its candidate people matches.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaceWithPeople {
    /// Native face ID from the vision service
    pub face_id: String,

    /// External image ID the face was indexed under
    pub external_image_id: String,

    /// Fractional bounding box of the face
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Source-image dimensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,

    /// Per-person aggregate similarity, in roster order
    #[serde(default)]
    pub people: Vec<PersonMatch>,

    /// Blob-store key of the source image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_key: Option<String>,

    /// Cloud identity of the owning user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identity_id: Option<String>,
}
