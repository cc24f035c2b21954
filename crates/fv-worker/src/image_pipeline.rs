//! Upload-processing pipeline.
//!
//! One ProcessImage job runs label detection, face indexing, and
//! identity resolution against the group roster, then persists the
//! updated roster and rewrites the image record's tags and people.
//! Partial failure is surfaced and logged, never rolled back; the next
//! mutating flow corrects what it finds.

use fv_engine::{compute_crop_dimensions, resolve_people, CropSubject, FaceCandidate};
use fv_models::{DetectedFace, ImageDimensions, ImageRecord};
use fv_queue::{GenerateThumbnailJob, ProcessImageJob};
use fv_storage::{load_roster, store_roster};

use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// Process a newly uploaded image.
pub async fn process_image(ctx: &ProcessingContext, job: &ProcessImageJob) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "process_image");
    logger.log_start(&format!("Processing image {}", job.image_id));

    // The record may already exist when the job is a redelivery.
    let record = match ctx.images.get(&job.image_id).await? {
        Some(record) => record,
        None => {
            let record = ImageRecord::new(
                job.image_id.clone(),
                &job.username,
                &job.user_identity_id,
                &job.img_key,
                &job.group,
                job.birthtime,
            );
            ctx.images.create(&record).await?;
            logger.log_progress("Created image record");
            record
        }
    };

    // The face collection is per-group; the image id doubles as the
    // external image id faces are indexed under.
    let (labels, faces, roster) = {
        let (labels_res, faces_res, roster_res) = tokio::join!(
            ctx.vision.detect_labels(&job.img_key),
            index_faces_with_recovery(ctx, &job.group, &job.img_key, job.image_id.as_str(), &logger),
            load_roster(&ctx.storage, &job.group),
        );
        (labels_res?, faces_res?, roster_res?)
    };

    logger.log_progress(&format!(
        "Detected {} labels, indexed {} faces, roster holds {} people",
        labels.len(),
        faces.len(),
        roster.len()
    ));

    let mut candidates = Vec::with_capacity(faces.len());
    for face in faces {
        let matches = ctx.vision.search_faces_by_id(&job.group, &face.face_id).await?;
        candidates.push(FaceCandidate::new(face, matches));
    }

    let dims = image_dimensions(&record);
    let resolution = resolve_people(
        &candidates,
        &roster,
        dims,
        &job.img_key,
        &job.user_identity_id,
    );

    store_roster(&ctx.storage, &job.group, &resolution.roster).await?;

    let mut tags = record.tags.clone();
    for label in &labels {
        if !tags.contains(&label.name) {
            tags.push(label.name.clone());
        }
    }
    ctx.images
        .update_tags_people(&job.image_id, &tags, &resolution.image_people)
        .await?;

    // Thumbnail generation is fire-and-forget: a lost request leaves a
    // person without a thumbnail, not a broken roster.
    for person in &resolution.new_people {
        let crop = compute_crop_dimensions(&CropSubject::from(person));
        let thumbnail_job = GenerateThumbnailJob::new(
            &job.group,
            person.id.as_str(),
            &job.user_identity_id,
            &job.img_key,
            crop,
        );
        if let Err(e) = ctx.queue.enqueue_thumbnail(thumbnail_job).await {
            logger.log_warning(&format!(
                "Failed to enqueue thumbnail for person {}: {}",
                person.id, e
            ));
        }
    }

    logger.log_completion(&format!(
        "{} faces resolved, {} new people, {} tags",
        candidates.len(),
        resolution.new_people.len(),
        tags.len()
    ));
    Ok(())
}

/// Index faces, recreating the group collection once if it is missing.
async fn index_faces_with_recovery(
    ctx: &ProcessingContext,
    collection_id: &str,
    img_key: &str,
    external_image_id: &str,
    logger: &JobLogger,
) -> WorkerResult<Vec<DetectedFace>> {
    match ctx
        .vision
        .index_faces(collection_id, img_key, external_image_id)
        .await
    {
        Err(e) if e.is_collection_not_found() => {
            logger.log_warning(&format!(
                "Collection {} missing, creating and retrying once",
                collection_id
            ));
            ctx.vision.create_collection(collection_id).await?;
            Ok(ctx
                .vision
                .index_faces(collection_id, img_key, external_image_id)
                .await?)
        }
        other => Ok(other?),
    }
}

/// Dimensions from record metadata, when present and usable.
fn image_dimensions(record: &ImageRecord) -> Option<ImageDimensions> {
    match (record.meta.width, record.meta.height) {
        (Some(width), Some(height)) => {
            let dims = ImageDimensions::new(width, height);
            dims.is_valid().then_some(dims)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fv_models::{ImageId, ImageMeta};

    fn record_with_meta(meta: ImageMeta) -> ImageRecord {
        let mut record = ImageRecord::new(
            ImageId::from_string("img-1"),
            "lucy",
            "identity-1",
            "uploads/lucy/photo.jpg",
            "family",
            1_700_000_000_000,
        );
        record.meta = meta;
        record
    }

    #[test]
    fn test_image_dimensions_from_meta() {
        let record = record_with_meta(ImageMeta {
            width: Some(1000.0),
            height: Some(500.0),
            ..Default::default()
        });

        let dims = image_dimensions(&record).unwrap();
        assert_eq!(dims.width, 1000.0);
        assert_eq!(dims.height, 500.0);
    }

    #[test]
    fn test_invalid_dimensions_are_dropped() {
        let record = record_with_meta(ImageMeta {
            width: Some(0.0),
            height: Some(500.0),
            ..Default::default()
        });
        assert!(image_dimensions(&record).is_none());

        let record = record_with_meta(ImageMeta::default());
        assert!(image_dimensions(&record).is_none());
    }
}
