//! Firestore REST API client.
//!
//! Production-grade client with:
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{RecordsError, RecordsResult};
use crate::metrics::{names as metric_names, record_request};
use crate::retry::RetryConfig;
use crate::token_cache::TokenCache;
use crate::types::{
    Document, RunQueryRequest, RunQueryResponse, StructuredQuery, Value,
};

// =============================================================================
// Configuration
// =============================================================================

/// Record store client configuration.
#[derive(Debug, Clone)]
pub struct RecordsConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Emulator host (host:port); skips real auth when set
    pub emulator_host: Option<String>,
}

impl RecordsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> RecordsResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                RecordsError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access the record store",
                )
            })?;

        if project_id.is_empty() {
            return Err(RecordsError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("RECORDS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST").ok(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
pub struct RecordsClient {
    http: Client,
    config: RecordsConfig,
    base_url: String,
    token_cache: Option<Arc<TokenCache>>,
}

impl Clone for RecordsClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            token_cache: self.token_cache.as_ref().map(Arc::clone),
        }
    }
}

impl RecordsClient {
    /// Create a new record store client.
    pub async fn new(config: RecordsConfig) -> RecordsResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("fv-records/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RecordsError::Network)?;

        let (base_url, token_cache) = match &config.emulator_host {
            Some(host) => {
                let base_url = format!(
                    "http://{}/v1/projects/{}/databases/{}/documents",
                    host, config.project_id, config.database_id
                );
                (base_url, None)
            }
            None => {
                let auth = Self::create_auth_provider()?;
                let base_url = format!(
                    "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
                    config.project_id, config.database_id
                );
                (base_url, Some(Arc::new(TokenCache::new(auth))))
            }
        };

        Ok(Self {
            http,
            config,
            base_url,
            token_cache,
        })
    }

    fn create_auth_provider() -> RecordsResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            RecordsError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(RecordsError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> RecordsResult<Self> {
        let config = RecordsConfig::from_env()?;
        Self::new(config).await
    }

    /// Get an access token.
    async fn get_token(&self) -> RecordsResult<String> {
        match &self.token_cache {
            Some(cache) => cache.get_token().await,
            // Emulator accepts any bearer token
            None => Ok("owner".to_string()),
        }
    }

    async fn invalidate_token(&self) {
        if let Some(cache) = &self.token_cache {
            cache.invalidate().await;
        }
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Build document path.
    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, doc_id)
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> RecordsResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), async {
            let mut token = self.get_token().await?;
            let mut response = self.http.get(&url).bearer_auth(&token).send().await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body) {
                    self.invalidate_token().await;
                    token = self.get_token().await?;
                    response = self.http.get(&url).bearer_auth(&token).send().await?;
                    status = response.status();
                } else {
                    return Err(RecordsError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body),
                    ));
                }
            }

            match status {
                StatusCode::OK => {
                    let doc: Document = response.json().await?;
                    Ok(Some(doc))
                }
                StatusCode::NOT_FOUND => Ok(None),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Create a document.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> RecordsResult<Document> {
        let url = format!("{}/{}?documentId={}", self.base_url, collection, doc_id);
        let body = Document::new(fields);

        self.execute_request("create_document", collection, Some(doc_id), async {
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body_text = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body_text) {
                    self.invalidate_token().await;
                    token = self.get_token().await?;
                    response = self
                        .http
                        .post(&url)
                        .bearer_auth(&token)
                        .json(&body)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(RecordsError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body_text),
                    ));
                }
            }

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    let doc: Document = response.json().await?;
                    Ok(doc)
                }
                StatusCode::CONFLICT => Err(RecordsError::AlreadyExists(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Update a document (merge via field mask).
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Option<Vec<String>>,
    ) -> RecordsResult<Document> {
        let mut url = self.document_path(collection, doc_id);
        if let Some(mask) = update_mask {
            let params: Vec<String> = mask
                .iter()
                .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
                .collect();
            url = format!("{}?{}", url, params.join("&"));
        }

        let body = Document::new(fields);

        self.execute_request("update_document", collection, Some(doc_id), async {
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .patch(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body_text = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body_text) {
                    self.invalidate_token().await;
                    token = self.get_token().await?;
                    response = self
                        .http
                        .patch(&url)
                        .bearer_auth(&token)
                        .json(&body)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(RecordsError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body_text),
                    ));
                }
            }

            match status {
                StatusCode::OK => {
                    let doc: Document = response.json().await?;
                    Ok(doc)
                }
                StatusCode::NOT_FOUND => Err(RecordsError::not_found(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Delete a document. Deleting an absent document succeeds.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> RecordsResult<()> {
        let url = self.document_path(collection, doc_id);
        let coll = collection.to_string();
        let id = doc_id.to_string();

        self.execute_request("delete_document", collection, Some(doc_id), async {
            let mut token = self.get_token().await?;
            let mut response = self.http.delete(&url).bearer_auth(&token).send().await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body) {
                    self.invalidate_token().await;
                    token = self.get_token().await?;
                    response = self.http.delete(&url).bearer_auth(&token).send().await?;
                    status = response.status();
                } else {
                    return Err(RecordsError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body),
                    ));
                }
            }

            match status {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                StatusCode::NOT_FOUND => {
                    debug!("Document {}/{} already deleted (idempotent)", coll, id);
                    Ok(())
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Query Operations
    // =========================================================================

    /// Run a structured query against root-level collections.
    pub async fn run_query(&self, query: StructuredQuery) -> RecordsResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.base_url);
        let request = RunQueryRequest {
            structured_query: query,
        };
        let collection = request
            .structured_query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();

        self.execute_request("run_query", &collection, None, async {
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(&request)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body) {
                    self.invalidate_token().await;
                    token = self.get_token().await?;
                    response = self
                        .http
                        .post(&url)
                        .bearer_auth(&token)
                        .json(&request)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(RecordsError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body),
                    ));
                }
            }

            match status {
                StatusCode::OK => {
                    let body = response.text().await.unwrap_or_default();
                    // runQuery returns a JSON array of RunQueryResponse objects
                    let responses: Vec<RunQueryResponse> = serde_json::from_str(&body)
                        .map_err(|e| {
                            RecordsError::request_failed(format!(
                                "Failed to parse runQuery response: {} (body prefix: {})",
                                e,
                                &body[..body.len().min(200)]
                            ))
                        })?;

                    let docs: Vec<Document> =
                        responses.into_iter().filter_map(|r| r.document).collect();

                    metrics::counter!(
                        metric_names::QUERY_DOCUMENTS_RETURNED_TOTAL,
                        "collection" => collection.clone()
                    )
                    .increment(docs.len() as u64);

                    Ok(docs)
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Execute with retry.
    pub async fn with_retry<T, F, Fut>(&self, operation: &str, op: F) -> RecordsResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = RecordsResult<T>>,
    {
        crate::retry::with_retry(&self.config.retry, operation, op).await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> RecordsResult<T>
    where
        F: std::future::Future<Output = RecordsResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("records_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("records_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> RecordsError {
        let body = response.text().await.unwrap_or_default();
        RecordsError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env_validates_project_id() {
        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("FIREBASE_PROJECT_ID");
        let result = RecordsConfig::from_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_config_default_values() {
        std::env::set_var("GCP_PROJECT_ID", "test-project");
        std::env::remove_var("RECORDS_CONNECT_TIMEOUT_SECS");
        let config = RecordsConfig::from_env().unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }
}
