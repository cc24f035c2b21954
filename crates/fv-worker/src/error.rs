//! Worker error types.

use thiserror::Error;

use fv_vision::VisionError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] fv_storage::StorageError),

    #[error("Record store error: {0}")]
    Records(#[from] fv_records::RecordsError),

    #[error("Vision service error: {0}")]
    Vision(#[from] fv_vision::VisionError),

    #[error("Queue error: {0}")]
    Queue(#[from] fv_queue::QueueError),

    #[error("Engine error: {0}")]
    Engine(#[from] fv_engine::EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if error is retryable.
    ///
    /// Engine errors and bad job payloads are deterministic and never
    /// retried; collaborator failures generally are.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Storage(_) | WorkerError::Queue(_) => true,
            WorkerError::Records(e) => e.is_retryable(),
            WorkerError::Vision(e) => {
                matches!(e, VisionError::ServerError(..) | VisionError::Network(_))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_are_not_retryable() {
        let err = WorkerError::from(fv_engine::EngineError::merge_failed("no candidates"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_side_vision_errors_are_retryable() {
        let err = WorkerError::from(VisionError::ServerError(503, "overloaded".to_string()));
        assert!(err.is_retryable());

        let err = WorkerError::from(VisionError::CollectionNotFound("family".to_string()));
        assert!(!err.is_retryable());
    }
}
