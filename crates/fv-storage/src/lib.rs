//! S3-compatible blob store client.
//!
//! This crate provides:
//! - Object upload/download/delete against an S3-compatible bucket
//! - Person roster persistence (gzip-compressed JSON)
//! - Search index persistence (gzip-compressed JSON)

pub mod client;
pub mod error;
pub mod index_store;
pub mod roster;

pub use client::{BlobStore, BlobStoreConfig};
pub use error::{StorageError, StorageResult};
pub use index_store::{compress_index, decompress_index, index_key, load_index, store_index};
pub use roster::{compress_roster, decompress_roster, load_roster, roster_key, store_roster};
