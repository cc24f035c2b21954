//! Shared collaborator clients for job processing.

use std::sync::Arc;

use fv_queue::JobQueue;
use fv_records::{ImageRepository, RecordsClient};
use fv_storage::BlobStore;
use fv_vision::VisionClient;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::thumbnail::ResizePublisher;

/// Collaborator clients shared by every job, built once at startup.
///
/// Flows take the context by reference; nothing in here carries
/// per-job state.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub storage: BlobStore,
    pub images: ImageRepository,
    pub vision: VisionClient,
    pub queue: Arc<JobQueue>,
    pub resize: ResizePublisher,
}

impl ProcessingContext {
    /// Build all collaborator clients from the environment.
    pub async fn new(config: WorkerConfig, queue: Arc<JobQueue>) -> WorkerResult<Self> {
        let storage = BlobStore::from_env().await?;
        let records = RecordsClient::from_env().await?;
        let images = ImageRepository::new(records);
        let vision = VisionClient::from_env()?;
        let resize = ResizePublisher::from_env()?;

        Ok(Self {
            config,
            storage,
            images,
            vision,
            queue,
            resize,
        })
    }
}
