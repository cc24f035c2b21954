//! Image processing worker.
//!
//! This crate provides:
//! - Job executor for process/merge/delete/index/thumbnail jobs
//! - The identity-resolution pipeline wiring engine, storage, records,
//!   and vision collaborators together
//! - Crash recovery via pending-entry claiming
//! - Graceful shutdown

pub mod config;
pub mod context;
pub mod delete_flow;
pub mod error;
pub mod executor;
pub mod image_pipeline;
pub mod index_stream;
pub mod logging;
pub mod merge_flow;
pub mod thumbnail;

pub use config::WorkerConfig;
pub use context::ProcessingContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use thumbnail::{ResizePublisher, ResizeRequest};
