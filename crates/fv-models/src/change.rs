//! Image change records consumed by the index maintainer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The kind of mutation a change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEvent {
    Insert,
    Modify,
    Remove,
}

/// The index-relevant slice of an image record: its tags and people.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageFacets {
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub people: Vec<String>,
}

impl ImageFacets {
    /// Create facets from tag and people lists.
    pub fn new(tags: Vec<String>, people: Vec<String>) -> Self {
        Self { tags, people }
    }
}

/// Before/after snapshot of one image mutation, restricted to the
/// fields the index maintainer counts. An absent snapshot means the
/// image did not exist on that side of the mutation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChangeRecord {
    /// What happened to the image
    pub event: ChangeEvent,

    /// Facets before the mutation (absent for inserts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<ImageFacets>,

    /// Facets after the mutation (absent for removes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<ImageFacets>,
}

impl ChangeRecord {
    /// A record for a newly inserted image.
    pub fn insert(new: ImageFacets) -> Self {
        Self {
            event: ChangeEvent::Insert,
            old: None,
            new: Some(new),
        }
    }

    /// A record for a modified image.
    pub fn modify(old: ImageFacets, new: ImageFacets) -> Self {
        Self {
            event: ChangeEvent::Modify,
            old: Some(old),
            new: Some(new),
        }
    }

    /// A record for a removed image.
    pub fn remove(old: ImageFacets) -> Self {
        Self {
            event: ChangeEvent::Remove,
            old: Some(old),
            new: None,
        }
    }
}
