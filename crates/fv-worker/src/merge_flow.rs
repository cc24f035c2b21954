//! Person merge flow.
//!
//! Collapses user-selected duplicate people into one surviving record
//! and rewrites the people array of every image that referenced a
//! merged id. Image updates are issued before the roster write so
//! in-flight readers still see the pre-merge people list.

use std::collections::HashSet;

use fv_engine::{merge_people, updated_people_for_image};
use fv_models::ImageId;
use fv_queue::MergePeopleJob;
use fv_storage::{load_roster, store_roster};

use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// Handle a MergePeople job.
pub async fn merge_people_job(ctx: &ProcessingContext, job: &MergePeopleJob) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "merge_people");
    logger.log_start(&format!(
        "Merging {} people in group {}",
        job.person_ids.len(),
        job.group
    ));

    let roster = load_roster(&ctx.storage, &job.group).await?;
    let outcome = merge_people(&job.person_ids, &roster)?;

    let mut seen: HashSet<ImageId> = HashSet::new();
    let mut rewritten = 0usize;
    for person_id in &job.person_ids {
        let images = ctx.images.query_by_person(&job.group, person_id).await?;
        for image in images {
            if !seen.insert(image.id.clone()) {
                continue;
            }
            let updated = updated_people_for_image(&image.people, &outcome);
            if updated != image.people {
                ctx.images.update_people(&image.id, &updated).await?;
                rewritten += 1;
            }
        }
    }

    store_roster(&ctx.storage, &job.group, &outcome.roster).await?;

    // Absorbed people's thumbnails are no longer referenced by anything.
    for person in &outcome.delete_people {
        if let Some(key) = &person.thumbnail {
            if let Err(e) = ctx.storage.delete_object(key).await {
                logger.log_warning(&format!("Failed to delete thumbnail {}: {}", key, e));
            }
        }
    }

    logger.log_completion(&format!(
        "Primary {}, absorbed {}, rewrote {} image records",
        outcome.primary.id,
        outcome.delete_people.len(),
        rewritten
    ));
    Ok(())
}
