//! Record store metrics collection.
//!
//! Provides standardized metrics for monitoring record store operations:
//! - Request counters by operation and status
//! - Latency histograms
//! - Retry counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total record store requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "records_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "records_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "records_latency_seconds";

    /// Documents returned by queries, by collection.
    pub const QUERY_DOCUMENTS_RETURNED_TOTAL: &str = "records_query_documents_returned_total";
}

/// Record metrics for a completed record store request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    let status_str = status.to_string();

    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status_str
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}
