//! Vision service error types.

use thiserror::Error;

/// Result type for vision service operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur during vision service operations.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Failed to configure vision client: {0}")]
    ConfigError(String),

    #[error("Face collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Face indexing failed for {image_key}: {message}")]
    IndexFaces { image_key: String, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisionError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn index_faces(image_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexFaces {
            image_key: image_key.into(),
            message: message.into(),
        }
    }

    /// True when the error means the face collection does not exist yet.
    ///
    /// Callers recover from this by creating the collection and retrying
    /// the indexing call exactly once.
    pub fn is_collection_not_found(&self) -> bool {
        matches!(self, Self::CollectionNotFound(_))
    }
}
