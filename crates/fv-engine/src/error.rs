//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors the pure core can report.
///
/// These are caller-input errors: they are surfaced immediately and
/// never retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot merge people: {0}")]
    MergeFailed(String),

    #[error("'To' date is prior to 'from' date")]
    InvalidDateRange,
}

impl EngineError {
    pub fn merge_failed(msg: impl Into<String>) -> Self {
        Self::MergeFailed(msg.into())
    }
}
