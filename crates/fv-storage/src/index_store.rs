//! Search index persistence.
//!
//! The per-group tag/person occurrence counts live in a single
//! gzip-compressed JSON blob, same shape as the roster blob.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::client::BlobStore;
use crate::error::{StorageError, StorageResult};
use fv_models::IndexCounts;

const CONTENT_TYPE_GZIP: &str = "application/gzip";

/// Blob key for a group's search index.
///
/// Format: `{group}/index.json.gz`
pub fn index_key(group: &str) -> String {
    format!("{}/index.json.gz", group)
}

/// Compress index counts to gzip JSON bytes.
pub fn compress_index(counts: &IndexCounts) -> StorageResult<Vec<u8>> {
    let json = serde_json::to_string(counts)
        .map_err(|e| StorageError::serialization(format!("Failed to serialize index: {}", e)))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(json.as_bytes())
        .map_err(|e| StorageError::serialization(format!("Failed to gzip index: {}", e)))?;

    encoder
        .finish()
        .map_err(|e| StorageError::serialization(format!("Failed to finish gzip encoding: {}", e)))
}

/// Decompress gzip JSON bytes to index counts.
pub fn decompress_index(data: &[u8]) -> StorageResult<IndexCounts> {
    let mut decoder = GzDecoder::new(data);
    let mut json = String::new();

    decoder
        .read_to_string(&mut json)
        .map_err(|e| StorageError::serialization(format!("Failed to decompress index: {}", e)))?;

    serde_json::from_str(&json)
        .map_err(|e| StorageError::serialization(format!("Failed to deserialize index: {}", e)))
}

/// Load a group's index, treating a missing blob as empty counts.
pub async fn load_index(store: &BlobStore, group: &str) -> StorageResult<IndexCounts> {
    let key = index_key(group);

    let data = match store.download_bytes(&key).await {
        Ok(data) => data,
        Err(e) if e.is_not_found() => {
            debug!(key = %key, "No index blob yet, starting empty");
            return Ok(IndexCounts::default());
        }
        Err(e) => return Err(e),
    };

    let counts = decompress_index(&data)?;
    debug!(
        key = %key,
        tags = counts.tags.len(),
        people = counts.people.len(),
        "Loaded index"
    );
    Ok(counts)
}

/// Store a group's index to the blob store.
pub async fn store_index(store: &BlobStore, group: &str, counts: &IndexCounts) -> StorageResult<()> {
    let key = index_key(group);
    let compressed = compress_index(counts)?;

    debug!(
        key = %key,
        tags = counts.tags.len(),
        people = counts.people.len(),
        "Storing index"
    );

    store.upload_bytes(compressed, &key, CONTENT_TYPE_GZIP).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_key() {
        assert_eq!(index_key("family-a"), "family-a/index.json.gz");
    }

    #[test]
    fn test_compress_decompress_roundtrip() {
        let mut counts = IndexCounts::default();
        counts.tags.insert("trees".to_string(), 3);
        counts.people.insert("p1".to_string(), 1);
        // Zero entries are retained, not dropped
        counts.tags.insert("beach".to_string(), 0);

        let compressed = compress_index(&counts).unwrap();
        let back = decompress_index(&compressed).unwrap();

        assert_eq!(back.tags.get("trees"), Some(&3));
        assert_eq!(back.tags.get("beach"), Some(&0));
        assert_eq!(back.people.get("p1"), Some(&1));
    }

    #[test]
    fn test_decompress_corrupt_data_is_an_error() {
        let result = decompress_index(b"definitely not gzip");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
