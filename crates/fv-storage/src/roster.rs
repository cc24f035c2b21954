//! Person roster persistence.
//!
//! The roster is the per-group list of known people, stored as a single
//! gzip-compressed JSON blob. There is no cross-store transaction with the
//! image records, so the roster is read-modify-write: load, mutate, store.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::client::BlobStore;
use crate::error::{StorageError, StorageResult};
use fv_models::Person;

/// Content type for gzip-compressed JSON.
const CONTENT_TYPE_GZIP: &str = "application/gzip";

/// Blob key for a group's roster.
///
/// Format: `{group}/people.json.gz`
pub fn roster_key(group: &str) -> String {
    format!("{}/people.json.gz", group)
}

/// Compress a roster to gzip JSON bytes.
pub fn compress_roster(people: &[Person]) -> StorageResult<Vec<u8>> {
    let json = serde_json::to_string(people)
        .map_err(|e| StorageError::serialization(format!("Failed to serialize roster: {}", e)))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(json.as_bytes())
        .map_err(|e| StorageError::serialization(format!("Failed to gzip roster: {}", e)))?;

    encoder
        .finish()
        .map_err(|e| StorageError::serialization(format!("Failed to finish gzip encoding: {}", e)))
}

/// Decompress gzip JSON bytes to a roster.
///
/// A corrupt payload is an error, not an empty roster: treating it as empty
/// would silently re-create every person on the next image.
pub fn decompress_roster(data: &[u8]) -> StorageResult<Vec<Person>> {
    let mut decoder = GzDecoder::new(data);
    let mut json = String::new();

    decoder
        .read_to_string(&mut json)
        .map_err(|e| StorageError::serialization(format!("Failed to decompress roster: {}", e)))?;

    serde_json::from_str(&json)
        .map_err(|e| StorageError::serialization(format!("Failed to deserialize roster: {}", e)))
}

/// Load a group's roster from the blob store.
///
/// A missing blob is a new group and yields an empty roster.
pub async fn load_roster(store: &BlobStore, group: &str) -> StorageResult<Vec<Person>> {
    let key = roster_key(group);

    let data = match store.download_bytes(&key).await {
        Ok(data) => data,
        Err(e) if e.is_not_found() => {
            debug!(key = %key, "No roster blob yet, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let people = decompress_roster(&data)?;
    debug!(key = %key, people = people.len(), "Loaded roster");
    Ok(people)
}

/// Store a group's roster to the blob store.
pub async fn store_roster(store: &BlobStore, group: &str, people: &[Person]) -> StorageResult<()> {
    let key = roster_key(group);
    let compressed = compress_roster(people)?;

    debug!(
        key = %key,
        people = people.len(),
        compressed_size = compressed.len(),
        "Storing roster"
    );

    store.upload_bytes(compressed, &key, CONTENT_TYPE_GZIP).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use fv_models::{FaceRef, PersonId};

    fn test_person(id: &str, face_id: &str) -> Person {
        Person::from_face(
            PersonId::from_string(id),
            FaceRef {
                external_image_id: "img-1".to_string(),
                face_id: face_id.to_string(),
            },
        )
    }

    #[test]
    fn test_roster_key() {
        assert_eq!(roster_key("family-a"), "family-a/people.json.gz");
    }

    #[test]
    fn test_compress_decompress_roundtrip() {
        let roster = vec![test_person("p1", "f1"), test_person("p2", "f2")];

        let compressed = compress_roster(&roster).unwrap();
        let back = decompress_roster(&compressed).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].id, roster[0].id);
        assert_eq!(back[1].faces[0].face_id, "f2");
    }

    #[test]
    fn test_decompress_corrupt_data_is_an_error() {
        let result = decompress_roster(b"not gzip data at all");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_decompress_invalid_json_is_an_error() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{ invalid json }").unwrap();
        let compressed = encoder.finish().unwrap();

        let result = decompress_roster(&compressed);
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_empty_roster_roundtrip() {
        let compressed = compress_roster(&[]).unwrap();
        let back = decompress_roster(&compressed).unwrap();
        assert!(back.is_empty());
    }
}
