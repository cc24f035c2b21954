//! Image deletion flow.
//!
//! Removes the record and its blobs, then recomputes person membership:
//! faces indexed from the deleted image are pruned from their people,
//! and people left with no faces and no remaining images are dropped
//! from the roster (their thumbnails deleted).

use fv_queue::DeleteImageJob;
use fv_storage::{load_roster, store_roster};

use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// Handle a DeleteImage job.
pub async fn delete_image(ctx: &ProcessingContext, job: &DeleteImageJob) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "delete_image");
    logger.log_start(&format!("Deleting image {}", job.image_id));

    let Some(record) = ctx.images.get(&job.image_id).await? else {
        // Redelivery after a completed delete.
        logger.log_warning("Image record already gone");
        return Ok(());
    };

    // Record first: a dangling blob is invisible, a dangling record is
    // not.
    ctx.images.delete(&job.image_id).await?;

    ctx.storage.delete_object(&record.img_key).await?;
    if !record.thumbnail_key.is_empty() {
        if let Err(e) = ctx.storage.delete_object(&record.thumbnail_key).await {
            logger.log_warning(&format!(
                "Failed to delete thumbnail {}: {}",
                record.thumbnail_key, e
            ));
        }
    }

    let roster = load_roster(&ctx.storage, &job.group).await?;
    let external_id = job.image_id.as_str();

    let mut updated = Vec::with_capacity(roster.len());
    let mut dropped = 0usize;
    for mut person in roster {
        let referenced = record.people.iter().any(|id| id == person.id.as_str())
            || person.faces.iter().any(|f| f.external_image_id == external_id);
        if !referenced {
            updated.push(person);
            continue;
        }

        person.faces.retain(|f| f.external_image_id != external_id);

        // The record is already deleted, so this query sees only the
        // images that remain.
        let remaining = ctx
            .images
            .query_by_person(&job.group, person.id.as_str())
            .await?;

        if person.faces.is_empty() && remaining.is_empty() {
            logger.log_progress(&format!(
                "Dropping person {} with no remaining images",
                person.id
            ));
            if let Some(key) = &person.thumbnail {
                if let Err(e) = ctx.storage.delete_object(key).await {
                    logger.log_warning(&format!("Failed to delete thumbnail {}: {}", key, e));
                }
            }
            dropped += 1;
        } else {
            updated.push(person);
        }
    }

    store_roster(&ctx.storage, &job.group, &updated).await?;

    logger.log_completion(&format!("Deleted image, dropped {} people", dropped));
    Ok(())
}
