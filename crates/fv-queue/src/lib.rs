//! Redis Streams job queue.
//!
//! This crate provides:
//! - Job enqueueing with idempotency-key deduplication
//! - Consumer-group consumption with retry/DLQ
//! - Pending-entry claiming for crashed workers

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{
    DeleteImageJob, GenerateThumbnailJob, IndexUpdateJob, MergePeopleJob, ProcessImageJob,
    QueueJob,
};
pub use queue::{JobQueue, QueueConfig};
