//! Shared data models for the FotoVault backend.
//!
//! This crate provides Serde-serializable types for:
//! - Image records and detected faces
//! - The people roster (face clusters)
//! - Face geometry (bounding boxes, landmarks, crop dimensions)
//! - Tag/people index counters and change records
//! - Query criteria for browsing images

pub mod change;
pub mod geometry;
pub mod image;
pub mod index;
pub mod job;
pub mod matching;
pub mod person;
pub mod query;

// Re-export common types
pub use change::{ChangeEvent, ChangeRecord, ImageFacets};
pub use geometry::{BoundingBox, CropDimensions, ImageDimensions, Landmark};
pub use image::{DetectedFace, ImageId, ImageMeta, ImageRecord};
pub use index::IndexCounts;
pub use job::JobId;
pub use matching::{FaceMatch, FaceWithPeople, PersonMatch};
pub use person::{FaceRef, Person, PersonId};
pub use query::{DateRange, QueryCriteria};
