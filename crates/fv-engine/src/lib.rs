//! Face-to-person identity resolution and index-maintenance core.
//!
//! This crate holds the pure computation at the heart of the backend:
//! - Crop geometry for face thumbnails
//! - Aggregate face/person similarity scoring
//! - Person resolution for newly detected faces
//! - Person merging with referential updates
//! - Tag/people counter maintenance from change records
//! - Query filtering with pagination and date clamping
//!
//! Everything here is deterministic and free of I/O; the worker crate
//! wires these functions to the storage, records, vision, and queue
//! collaborators.

pub mod error;
pub mod geometry;
pub mod index;
pub mod matching;
pub mod merge;
pub mod query;
pub mod resolution;

pub use error::{EngineError, EngineResult};
pub use geometry::{compute_crop_dimensions, person_thumbnail_key, CropSubject, DEFAULT_CROP};
pub use index::{parse_index_deltas, update_counts, IndexDeltas};
pub use matching::{aggregate_similarity, is_match, match_against_roster, MATCH_THRESHOLD};
pub use merge::{merge_people, updated_people_for_image, MergeOutcome};
pub use query::{
    apply_limit, calculate_from_date, calculate_to_date, filter_and_paginate,
    filter_items_by_criteria, has_criteria, QueryResponse, MAX_DATE_RANGE,
};
pub use resolution::{resolve_people, FaceCandidate, Resolution};
