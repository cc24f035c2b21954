//! Person thumbnail crop requests.
//!
//! The worker computes crop geometry only; the actual pixel work is
//! done by an external resize unit that consumes requests from a Redis
//! stream. A redelivered thumbnail job overwrites the same target key,
//! so publishing twice is harmless.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use fv_engine::{compute_crop_dimensions, person_thumbnail_key, CropSubject};
use fv_models::CropDimensions;
use fv_queue::{GenerateThumbnailJob, QueueError};

use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Default stream the resize unit consumes from.
const DEFAULT_RESIZE_STREAM: &str = "fv:resize";

/// One crop request for the external resize unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeRequest {
    /// Blob-store key of the source image
    pub source_key: String,
    /// Blob-store key the cropped thumbnail is written to
    pub target_key: String,
    /// Pixel rectangle to cut out of the source
    pub crop: CropDimensions,
    /// Content type of the produced thumbnail
    pub content_type: String,
}

/// Publishes resize requests onto the stream the resize unit consumes.
#[derive(Clone)]
pub struct ResizePublisher {
    client: redis::Client,
    stream: String,
}

impl ResizePublisher {
    /// Create a publisher from `REDIS_URL` and `RESIZE_STREAM`.
    pub fn from_env() -> WorkerResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let stream =
            std::env::var("RESIZE_STREAM").unwrap_or_else(|_| DEFAULT_RESIZE_STREAM.to_string());
        let client = redis::Client::open(redis_url)
            .map_err(|e| WorkerError::Queue(QueueError::Redis(e)))?;

        Ok(Self { client, stream })
    }

    /// Publish a crop request. Returns the stream entry id.
    pub async fn publish(&self, request: &ResizeRequest) -> WorkerResult<String> {
        let payload = serde_json::to_string(request).map_err(|e| {
            WorkerError::processing_failed(format!("Failed to serialize resize request: {}", e))
        })?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| WorkerError::Queue(QueueError::Redis(e)))?;

        let entry_id: String = conn
            .xadd(&self.stream, "*", &[("request", payload.as_str())])
            .await
            .map_err(|e| WorkerError::Queue(QueueError::Redis(e)))?;

        Ok(entry_id)
    }
}

/// Handle a GenerateThumbnail job.
///
/// The crop is re-derived from the current roster when the person still
/// exists; the geometry carried by the job is the fallback for people
/// pruned between enqueue and delivery.
pub async fn generate_thumbnail(
    ctx: &ProcessingContext,
    job: &GenerateThumbnailJob,
) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "generate_thumbnail");
    logger.log_start(&format!("Thumbnail crop for person {}", job.person_id));

    let roster = fv_storage::load_roster(&ctx.storage, &job.group).await?;
    let crop = roster
        .iter()
        .find(|p| p.id.as_str() == job.person_id)
        .map(|p| compute_crop_dimensions(&CropSubject::from(p)))
        .unwrap_or(job.crop);

    let request = ResizeRequest {
        source_key: job.img_key.clone(),
        target_key: person_thumbnail_key(&job.user_identity_id, &job.person_id),
        crop,
        content_type: "image/jpeg".to_string(),
    };

    let entry_id = ctx.resize.publish(&request).await?;
    logger.log_completion(&format!("Published resize request {}", entry_id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_request_roundtrip() {
        let request = ResizeRequest {
            source_key: "uploads/lucy/photo.jpg".to_string(),
            target_key: "identity-1/faces/p1.jpg".to_string(),
            crop: CropDimensions {
                left: 185,
                top: 60,
                width: 330,
                height: 330,
            },
            content_type: "image/jpeg".to_string(),
        };

        let json = serde_json::to_string(&request).unwrap();
        let parsed: ResizeRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.target_key, request.target_key);
        assert_eq!(parsed.crop, request.crop);
    }
}
