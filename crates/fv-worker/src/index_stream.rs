//! Search-index maintenance.
//!
//! One IndexUpdate job carries a batch of record change events. The
//! deltas fold into the group's counter blob with a clamp at zero, so
//! redelivering a batch can under-count but never corrupts the index.

use tracing::info;

use fv_engine::{parse_index_deltas, update_counts};
use fv_queue::IndexUpdateJob;
use fv_storage::{load_index, store_index};

use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// Handle an IndexUpdate job.
pub async fn update_index(ctx: &ProcessingContext, job: &IndexUpdateJob) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "index_update");
    logger.log_start(&format!(
        "Folding {} change records into index for group {}",
        job.changes.len(),
        job.group
    ));

    let deltas = parse_index_deltas(&job.changes);
    if deltas.is_empty() {
        logger.log_completion("No countable changes in batch");
        return Ok(());
    }

    let existing = load_index(&ctx.storage, &job.group).await?;
    let updated = update_counts(&existing, &deltas);

    info!(
        group = %job.group,
        tags_before = existing.tags.len(),
        people_before = existing.people.len(),
        tags_after = updated.tags.len(),
        people_after = updated.people.len(),
        "Applying index deltas"
    );

    store_index(&ctx.storage, &job.group, &updated).await?;

    logger.log_completion(&format!(
        "Index now tracks {} tags and {} people",
        updated.tags.len(),
        updated.people.len()
    ));
    Ok(())
}
