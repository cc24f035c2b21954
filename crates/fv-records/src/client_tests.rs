//! Tests for record store client functionality.

use std::time::Duration;

use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{RecordsClient, RecordsConfig};
use crate::error::RecordsError;
use crate::retry::RetryConfig;

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config(emulator_host: Option<String>) -> RecordsConfig {
    RecordsConfig {
        project_id: "test-project".to_string(),
        database_id: "(default)".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        },
        emulator_host,
    }
}

async fn mock_client(server: &MockServer) -> RecordsClient {
    let host = server.uri().trim_start_matches("http://").to_string();
    RecordsClient::new(test_config(Some(host)))
        .await
        .expect("client should build against emulator host")
}

fn document_path(collection: &str, doc_id: &str) -> String {
    format!(
        "/v1/projects/test-project/databases/(default)/documents/{}/{}",
        collection, doc_id
    )
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status_429() {
    let err = RecordsError::from_http_status(429, "rate limited");
    assert!(matches!(err, RecordsError::RateLimited(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_500() {
    let err = RecordsError::from_http_status(500, "internal error");
    assert!(matches!(err, RecordsError::ServerError(500, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_503() {
    let err = RecordsError::from_http_status(503, "service unavailable");
    assert!(matches!(err, RecordsError::ServerError(503, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_400() {
    let err = RecordsError::from_http_status(400, "bad request");
    assert!(matches!(err, RecordsError::RequestFailed(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_404() {
    let err = RecordsError::from_http_status(404, "not found");
    assert!(matches!(err, RecordsError::NotFound(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_409() {
    let err = RecordsError::from_http_status(409, "conflict");
    assert!(matches!(err, RecordsError::AlreadyExists(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_http_status_getter() {
    assert_eq!(RecordsError::RateLimited(1000).http_status(), Some(429));
    assert_eq!(
        RecordsError::ServerError(502, "bad gateway".into()).http_status(),
        Some(502)
    );
    assert_eq!(
        RecordsError::NotFound("doc".into()).http_status(),
        Some(404)
    );
}

#[test]
fn test_error_retry_after_ms() {
    assert_eq!(RecordsError::RateLimited(5000).retry_after_ms(), Some(5000));
    assert_eq!(
        RecordsError::ServerError(500, "error".into()).retry_after_ms(),
        None
    );
}

// =============================================================================
// HTTP Status Handling Tests
// =============================================================================

#[tokio::test]
async fn test_get_document_404_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(document_path("images", "missing")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let result = client.get_document("images", "missing").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_get_document_ok_returns_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(document_path("images", "img-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "projects/test-project/databases/(default)/documents/images/img-1",
            "fields": {
                "username": { "stringValue": "lucy" },
                "birthtime": { "integerValue": "345" }
            }
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let doc = client
        .get_document("images", "img-1")
        .await
        .unwrap()
        .expect("document should be found");
    assert!(doc.fields.unwrap().contains_key("username"));
}

#[tokio::test]
async fn test_get_document_500_surfaces_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(document_path("images", "img-1")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let result = client.get_document("images", "img-1").await;
    assert!(matches!(result, Err(RecordsError::ServerError(500, _))));
}

#[tokio::test]
async fn test_delete_document_404_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(document_path("images", "gone")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    client.delete_document("images", "gone").await.unwrap();
}

// =============================================================================
// Retry Policy Tests
// =============================================================================

#[tokio::test]
async fn test_retry_logic_retries_on_server_errors() {
    let err = RecordsError::from_http_status(500, "Internal Server Error");
    assert!(err.is_retryable(), "500 errors should be retryable");

    let err = RecordsError::from_http_status(502, "Bad Gateway");
    assert!(err.is_retryable(), "502 errors should be retryable");

    let err = RecordsError::from_http_status(429, "Too Many Requests");
    assert!(err.is_retryable(), "429 errors should be retryable");
}

#[tokio::test]
async fn test_no_retry_on_404() {
    let err = RecordsError::from_http_status(404, "not found");
    assert!(!err.is_retryable());
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_validates_empty_project_id() {
    std::env::set_var("GCP_PROJECT_ID", "");
    std::env::remove_var("FIREBASE_PROJECT_ID");
    let result = RecordsConfig::from_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_config_accepts_firebase_project_id() {
    std::env::remove_var("GCP_PROJECT_ID");
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = RecordsConfig::from_env().unwrap();
    assert_eq!(config.project_id, "firebase-project");
}

#[test]
#[serial]
fn test_config_parses_retry_env_vars() {
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("RECORDS_RETRY_BASE_MS", "50");
    std::env::set_var("RECORDS_RETRY_MAX_MS", "2000");
    let config = RecordsConfig::from_env().unwrap();
    assert_eq!(config.retry.base_delay_ms, 50);
    assert_eq!(config.retry.max_delay_ms, 2000);
}

#[test]
#[serial]
fn test_config_handles_invalid_env_values() {
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("RECORDS_CONNECT_TIMEOUT_SECS", "not-a-number");
    let config = RecordsConfig::from_env().unwrap();
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
}
