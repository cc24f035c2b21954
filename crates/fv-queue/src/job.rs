//! Job types for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fv_models::{ChangeRecord, CropDimensions, ImageId, JobId};

/// Job to process a newly uploaded image.
///
/// Runs label detection, face indexing, identity resolution against the
/// group roster, and the record/roster writes that follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessImageJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Owning username
    pub username: String,
    /// Cloud identity of the uploader
    pub user_identity_id: String,
    /// Image ID (also the external image id for face indexing)
    pub image_id: ImageId,
    /// Blob-store key of the uploaded image
    pub img_key: String,
    /// Tenant/family namespace
    pub group: String,
    /// Logical capture time (epoch milliseconds)
    pub birthtime: i64,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl ProcessImageJob {
    pub fn new(
        username: impl Into<String>,
        user_identity_id: impl Into<String>,
        image_id: ImageId,
        img_key: impl Into<String>,
        group: impl Into<String>,
        birthtime: i64,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            username: username.into(),
            user_identity_id: user_identity_id.into(),
            image_id,
            img_key: img_key.into(),
            group: group.into(),
            birthtime,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("process:{}:{}", self.group, self.image_id)
    }
}

/// Job to merge several people into one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePeopleJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Tenant/family namespace
    pub group: String,
    /// Person ids to merge, in request order (order breaks ties)
    pub person_ids: Vec<String>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl MergePeopleJob {
    pub fn new(group: impl Into<String>, person_ids: Vec<String>) -> Self {
        Self {
            job_id: JobId::new(),
            group: group.into(),
            person_ids,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("merge:{}:{}", self.group, self.person_ids.join("+"))
    }
}

/// Job to delete an image and clean up its person references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteImageJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Tenant/family namespace
    pub group: String,
    /// Image ID to delete
    pub image_id: ImageId,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl DeleteImageJob {
    pub fn new(group: impl Into<String>, image_id: ImageId) -> Self {
        Self {
            job_id: JobId::new(),
            group: group.into(),
            image_id,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("delete:{}:{}", self.group, self.image_id)
    }
}

/// Job carrying a batch of record change events for index maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexUpdateJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Tenant/family namespace
    pub group: String,
    /// Change events, in stream order
    pub changes: Vec<ChangeRecord>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl IndexUpdateJob {
    pub fn new(group: impl Into<String>, changes: Vec<ChangeRecord>) -> Self {
        Self {
            job_id: JobId::new(),
            group: group.into(),
            changes,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    ///
    /// Change batches are not content-addressable, so each batch is its
    /// own key. Replays of the same batch reuse the original job id.
    pub fn idempotency_key(&self) -> String {
        format!("index:{}:{}", self.group, self.job_id)
    }
}

/// Job to crop and store a person's thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateThumbnailJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Tenant/family namespace
    pub group: String,
    /// Person the thumbnail belongs to
    pub person_id: String,
    /// Cloud identity owning the target thumbnail key
    pub user_identity_id: String,
    /// Source image key
    pub img_key: String,
    /// Pixel crop to apply
    pub crop: CropDimensions,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl GenerateThumbnailJob {
    pub fn new(
        group: impl Into<String>,
        person_id: impl Into<String>,
        user_identity_id: impl Into<String>,
        img_key: impl Into<String>,
        crop: CropDimensions,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            group: group.into(),
            person_id: person_id.into(),
            user_identity_id: user_identity_id.into(),
            img_key: img_key.into(),
            crop,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    ///
    /// Keyed by person id so a redelivered job overwrites the same
    /// thumbnail instead of producing a second one.
    pub fn idempotency_key(&self) -> String {
        format!("thumbnail:{}:{}", self.group, self.person_id)
    }
}

/// Envelope for all queue job types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    /// Pipeline job: label detection, face indexing, identity resolution
    ProcessImage(ProcessImageJob),
    /// Roster job: merge people into one
    MergePeople(MergePeopleJob),
    /// Cleanup job: delete an image and recompute person membership
    DeleteImage(DeleteImageJob),
    /// Index job: fold record change events into the search index
    IndexUpdate(IndexUpdateJob),
    /// Media job: crop and store a person thumbnail
    GenerateThumbnail(GenerateThumbnailJob),
}

impl QueueJob {
    pub fn job_id(&self) -> &JobId {
        match self {
            QueueJob::ProcessImage(j) => &j.job_id,
            QueueJob::MergePeople(j) => &j.job_id,
            QueueJob::DeleteImage(j) => &j.job_id,
            QueueJob::IndexUpdate(j) => &j.job_id,
            QueueJob::GenerateThumbnail(j) => &j.job_id,
        }
    }

    pub fn group(&self) -> &str {
        match self {
            QueueJob::ProcessImage(j) => &j.group,
            QueueJob::MergePeople(j) => &j.group,
            QueueJob::DeleteImage(j) => &j.group,
            QueueJob::IndexUpdate(j) => &j.group,
            QueueJob::GenerateThumbnail(j) => &j.group,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::ProcessImage(j) => j.idempotency_key(),
            QueueJob::MergePeople(j) => j.idempotency_key(),
            QueueJob::DeleteImage(j) => j.idempotency_key(),
            QueueJob::IndexUpdate(j) => j.idempotency_key(),
            QueueJob::GenerateThumbnail(j) => j.idempotency_key(),
        }
    }

    /// Short operation name for logging.
    pub fn operation(&self) -> &'static str {
        match self {
            QueueJob::ProcessImage(_) => "process_image",
            QueueJob::MergePeople(_) => "merge_people",
            QueueJob::DeleteImage(_) => "delete_image",
            QueueJob::IndexUpdate(_) => "index_update",
            QueueJob::GenerateThumbnail(_) => "generate_thumbnail",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_job_serde_roundtrip() {
        let job = ProcessImageJob::new(
            "lucy",
            "identity-1",
            ImageId::from_string("img-1"),
            "lucy/uploads/photo.jpg",
            "family",
            1_700_000_000_000,
        );

        let wrapper = QueueJob::ProcessImage(job.clone());
        let json = serde_json::to_string(&wrapper).expect("serialize QueueJob");
        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize QueueJob");

        match decoded {
            QueueJob::ProcessImage(j) => {
                assert_eq!(j.job_id, job.job_id);
                assert_eq!(j.image_id, job.image_id);
                assert_eq!(j.group, job.group);
                assert_eq!(j.birthtime, job.birthtime);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_process_idempotency_key_is_stable() {
        let a = ProcessImageJob::new("lucy", "id", ImageId::from_string("img-1"), "k", "g", 0);
        let b = ProcessImageJob::new("lucy", "id", ImageId::from_string("img-1"), "k", "g", 0);
        // Different job ids, same dedup key
        assert_ne!(a.job_id, b.job_id);
        assert_eq!(a.idempotency_key(), b.idempotency_key());
    }

    #[test]
    fn test_merge_idempotency_key_preserves_order() {
        let a = MergePeopleJob::new("g", vec!["p1".into(), "p2".into()]);
        let b = MergePeopleJob::new("g", vec!["p2".into(), "p1".into()]);
        // Order is significant for merge tie-breaking
        assert_ne!(a.idempotency_key(), b.idempotency_key());
    }

    #[test]
    fn test_thumbnail_idempotency_key_is_per_person() {
        let crop = CropDimensions {
            left: 0,
            top: 0,
            width: 200,
            height: 200,
        };
        let a = GenerateThumbnailJob::new("g", "person-1", "id", "img-a.jpg", crop);
        let b = GenerateThumbnailJob::new("g", "person-1", "id", "img-b.jpg", crop);
        assert_eq!(a.idempotency_key(), b.idempotency_key());
    }
}
