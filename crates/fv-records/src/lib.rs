//! Firestore REST API record store client.
//!
//! This crate provides:
//! - Typed repository for image records
//! - Service account authentication via gcp_auth
//! - Merge updates with field masks and retry logic
//! - Structured queries (time-range and array-contains)

pub mod client;
pub mod error;
pub mod image_repo;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;

#[cfg(test)]
mod client_tests;

pub use client::{RecordsClient, RecordsConfig};
pub use error::{RecordsError, RecordsResult};
pub use image_repo::ImageRepository;
pub use retry::RetryConfig;
pub use types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};
