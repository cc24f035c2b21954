//! Vision service REST client.
//!
//! This crate provides:
//! - Face detection and indexing into per-group collections
//! - Similar-face search by indexed face id
//! - Label detection
//! - Idempotent collection creation

pub mod client;
pub mod error;

#[cfg(test)]
mod client_tests;

pub use client::{DetectedLabel, VisionClient, VisionConfig};
pub use error::{VisionError, VisionResult};
