//! Typed repository for image records.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use fv_models::{ImageId, ImageRecord};

use crate::client::RecordsClient;
use crate::error::{RecordsError, RecordsResult};
use crate::types::{
    CollectionSelector, Document, FieldReference, Filter, Order, StructuredQuery,
    ToFirestoreValue, Value,
};

/// Root-level collection holding image documents.
const IMAGES_COLLECTION: &str = "images";

/// Repository for image documents.
#[derive(Clone)]
pub struct ImageRepository {
    client: RecordsClient,
}

impl ImageRepository {
    /// Create a new image repository.
    pub fn new(client: RecordsClient) -> Self {
        Self { client }
    }

    /// Get an image record by ID.
    pub async fn get(&self, image_id: &ImageId) -> RecordsResult<Option<ImageRecord>> {
        let doc = self
            .client
            .get_document(IMAGES_COLLECTION, image_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_record(&d, image_id.as_str())?)),
            None => Ok(None),
        }
    }

    /// Create a new image record.
    pub async fn create(&self, record: &ImageRecord) -> RecordsResult<()> {
        let fields = record_to_fields(record)?;
        self.client
            .create_document(IMAGES_COLLECTION, record.id.as_str(), fields)
            .await?;
        info!("Created image record: {}", record.id);
        Ok(())
    }

    /// Replace the person references on an image.
    pub async fn update_people(&self, image_id: &ImageId, people: &[String]) -> RecordsResult<()> {
        let mut fields = HashMap::new();
        fields.insert("people".to_string(), people.to_vec().to_firestore_value());
        fields.insert(
            "updated_at".to_string(),
            Utc::now().timestamp_millis().to_firestore_value(),
        );

        self.client
            .update_document(
                IMAGES_COLLECTION,
                image_id.as_str(),
                fields,
                Some(vec!["people".to_string(), "updated_at".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Replace both tags and person references on an image.
    pub async fn update_tags_people(
        &self,
        image_id: &ImageId,
        tags: &[String],
        people: &[String],
    ) -> RecordsResult<()> {
        let mut fields = HashMap::new();
        fields.insert("tags".to_string(), tags.to_vec().to_firestore_value());
        fields.insert("people".to_string(), people.to_vec().to_firestore_value());
        fields.insert(
            "updated_at".to_string(),
            Utc::now().timestamp_millis().to_firestore_value(),
        );

        self.client
            .update_document(
                IMAGES_COLLECTION,
                image_id.as_str(),
                fields,
                Some(vec![
                    "tags".to_string(),
                    "people".to_string(),
                    "updated_at".to_string(),
                ]),
            )
            .await?;
        Ok(())
    }

    /// Delete an image record. Idempotent under redelivery.
    pub async fn delete(&self, image_id: &ImageId) -> RecordsResult<()> {
        self.client
            .delete_document(IMAGES_COLLECTION, image_id.as_str())
            .await?;
        info!("Deleted image record: {}", image_id);
        Ok(())
    }

    /// Query a user's images within a birthtime window (inclusive).
    pub async fn query_by_user_time_range(
        &self,
        username: &str,
        from: i64,
        to: i64,
    ) -> RecordsResult<Vec<ImageRecord>> {
        self.query_time_range("username", username, from, to).await
    }

    /// Query a group's images within a birthtime window (inclusive).
    pub async fn query_by_group_time_range(
        &self,
        group: &str,
        from: i64,
        to: i64,
    ) -> RecordsResult<Vec<ImageRecord>> {
        self.query_time_range("group", group, from, to).await
    }

    async fn query_time_range(
        &self,
        scope_field: &str,
        scope_value: &str,
        from: i64,
        to: i64,
    ) -> RecordsResult<Vec<ImageRecord>> {
        let query = StructuredQuery {
            from: vec![CollectionSelector {
                collection_id: IMAGES_COLLECTION.to_string(),
                all_descendants: None,
            }],
            r#where: Some(Filter::and(vec![
                Filter::field(
                    scope_field,
                    "EQUAL",
                    Value::StringValue(scope_value.to_string()),
                ),
                Filter::field(
                    "birthtime",
                    "GREATER_THAN_OR_EQUAL",
                    from.to_firestore_value(),
                ),
                Filter::field("birthtime", "LESS_THAN_OR_EQUAL", to.to_firestore_value()),
            ])),
            order_by: Some(vec![Order {
                field: FieldReference {
                    field_path: "birthtime".to_string(),
                },
                direction: "ASCENDING".to_string(),
            }]),
            start_at: None,
            limit: None,
        };

        let docs = self.client.run_query(query).await?;
        documents_to_records(docs)
    }

    /// All images in a group referencing a person (array-contains).
    ///
    /// Feeds the merge and delete flows, which rewrite person references
    /// across every image that mentions one.
    pub async fn query_by_person(
        &self,
        group: &str,
        person_id: &str,
    ) -> RecordsResult<Vec<ImageRecord>> {
        let query = StructuredQuery {
            from: vec![CollectionSelector {
                collection_id: IMAGES_COLLECTION.to_string(),
                all_descendants: None,
            }],
            r#where: Some(Filter::and(vec![
                Filter::field("group", "EQUAL", Value::StringValue(group.to_string())),
                Filter::field(
                    "people",
                    "ARRAY_CONTAINS",
                    Value::StringValue(person_id.to_string()),
                ),
            ])),
            order_by: None,
            start_at: None,
            limit: None,
        };

        let docs = self.client.run_query(query).await?;
        documents_to_records(docs)
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// Convert an image record to Firestore fields.
///
/// Goes through serde_json so nested structures (faces, metadata) keep
/// their model serialization.
pub fn record_to_fields(record: &ImageRecord) -> RecordsResult<HashMap<String, Value>> {
    let json = serde_json::to_value(record)
        .map_err(|e| RecordsError::serialization(format!("Failed to serialize record: {}", e)))?;

    match json {
        serde_json::Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect()),
        _ => Err(RecordsError::serialization(
            "Image record did not serialize to an object",
        )),
    }
}

/// Convert a Firestore document back to an image record.
pub fn document_to_record(doc: &Document, image_id: &str) -> RecordsResult<ImageRecord> {
    let fields = doc.fields.as_ref().ok_or_else(|| {
        RecordsError::serialization(format!("Document {} has no fields", image_id))
    })?;

    let json = serde_json::Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    );

    serde_json::from_value(json).map_err(|e| {
        RecordsError::serialization(format!("Failed to deserialize record {}: {}", image_id, e))
    })
}

fn documents_to_records(docs: Vec<Document>) -> RecordsResult<Vec<ImageRecord>> {
    docs.iter()
        .map(|d| {
            let id = d
                .name
                .as_deref()
                .and_then(|n| n.rsplit('/').next())
                .unwrap_or("<unknown>");
            document_to_record(d, id)
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
