//! Image record models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::geometry::{BoundingBox, Landmark};

/// Unique identifier for an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ImageId(pub String);

impl ImageId {
    /// Generate a new random image ID.
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

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A face detected in an image by the vision service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedFace {
    /// Native face ID assigned by the vision service
    pub face_id: String,

    /// External image ID the face was indexed under
    pub external_image_id: String,

    /// Fractional bounding box of the face
    pub bounding_box: BoundingBox,

    /// Facial landmark points, when the service reports them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub landmarks: Vec<Landmark>,
}

/// Image metadata (dimensions plus optional extra fields from EXIF).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ImageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Additional metadata fields (EXIF and friends), kept as-is
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One uploaded photo as stored in the record store.
///
/// `id` is immutable once assigned. The `people` field references roster
/// person ids and is eventually consistent with the roster blob: the two
/// live in independent stores with no cross-store transaction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageRecord {
    /// Unique image ID
    pub id: ImageId,

    /// Owning username
    pub username: String,

    /// Cloud identity of the uploader
    pub user_identity_id: String,

    /// Blob-store key of the full-size image
    pub img_key: String,

    /// Blob-store key of the thumbnail
    #[serde(default)]
    pub thumbnail_key: String,

    /// Logical capture time (epoch milliseconds)
    pub birthtime: i64,

    /// Server-assigned creation time (epoch milliseconds)
    pub created_at: i64,

    /// Server-assigned last-update time (epoch milliseconds)
    pub updated_at: i64,

    /// Tenant/family namespace
    pub group: String,

    /// User-assigned tags plus detected labels
    #[serde(default)]
    pub tags: Vec<String>,

    /// Person ids associated with this image
    #[serde(default)]
    pub people: Vec<String>,

    /// Faces detected in this image, in detection order
    #[serde(default)]
    pub faces: Vec<DetectedFace>,

    /// Image metadata
    #[serde(default)]
    pub meta: ImageMeta,
}

impl ImageRecord {
    /// Create a new image record at upload-processing time.
    pub fn new(
        id: ImageId,
        username: impl Into<String>,
        user_identity_id: impl Into<String>,
        img_key: impl Into<String>,
        group: impl Into<String>,
        birthtime: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();

        Self {
            id,
            username: username.into(),
            user_identity_id: user_identity_id.into(),
            img_key: img_key.into(),
            thumbnail_key: String::new(),
            birthtime,
            created_at: now,
            updated_at: now,
            group: group.into(),
            tags: Vec::new(),
            people: Vec::new(),
            faces: Vec::new(),
            meta: ImageMeta::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_generation() {
        let id1 = ImageId::new();
        let id2 = ImageId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_image_record_creation() {
        let id = ImageId::new();
        let record = ImageRecord::new(
            id.clone(),
            "lucy",
            "identity-123",
            "uploads/lucy/photo.jpg",
            "family",
            1_700_000_000_000,
        );

        assert_eq!(record.id, id);
        assert_eq!(record.group, "family");
        assert!(record.tags.is_empty());
        assert!(record.people.is_empty());
    }

    #[test]
    fn test_image_record_roundtrip() {
        let record = ImageRecord::new(
            ImageId::from_string("img-1"),
            "bob",
            "identity-9",
            "uploads/bob/p.jpg",
            "group-a",
            345,
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: ImageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.birthtime, 345);
    }
}
