//! Vision service client implementation.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fv_models::{DetectedFace, FaceMatch};

use crate::error::{VisionError, VisionResult};

// =============================================================================
// Configuration
// =============================================================================

/// Vision service client configuration.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Service base URL
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl VisionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        let base_url = std::env::var("VISION_BASE_URL")
            .map_err(|_| VisionError::config_error("VISION_BASE_URL not set"))?;

        let timeout_secs: u64 = std::env::var("VISION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("VISION_API_KEY").ok(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// A label detected in an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedLabel {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    collection_id: &'a str,
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    image_key: &'a str,
}

#[derive(Debug, Serialize)]
struct IndexFacesRequest<'a> {
    image_key: &'a str,
    external_image_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchFacesRequest<'a> {
    face_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<DetectedLabel>,
}

#[derive(Debug, Deserialize)]
struct FacesResponse {
    #[serde(default)]
    faces: Vec<DetectedFace>,
}

#[derive(Debug, Deserialize)]
struct SearchFacesResponse {
    #[serde(default)]
    matches: Vec<FaceMatch>,
}

// =============================================================================
// Client
// =============================================================================

/// Vision service REST client.
#[derive(Clone)]
pub struct VisionClient {
    http: Client,
    config: VisionConfig,
}

impl VisionClient {
    /// Create a new vision client.
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("fv-vision/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(VisionConfig::from_env()?)
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.post(url);
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Create a face collection. Treats an already-existing collection as
    /// success, so callers can invoke this unconditionally.
    pub async fn create_collection(&self, collection_id: &str) -> VisionResult<()> {
        let url = format!("{}/collections", self.config.base_url);
        let response = self
            .request(&url)
            .json(&CreateCollectionRequest { collection_id })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                info!(collection_id = %collection_id, "Created face collection");
                Ok(())
            }
            StatusCode::CONFLICT => {
                debug!(collection_id = %collection_id, "Face collection already exists");
                Ok(())
            }
            status => Err(Self::error_from_response(status, &url, response).await),
        }
    }

    /// Detect labels in an image.
    pub async fn detect_labels(&self, image_key: &str) -> VisionResult<Vec<DetectedLabel>> {
        let url = format!("{}/detect-labels", self.config.base_url);
        let response = self
            .request(&url)
            .json(&DetectRequest { image_key })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: DetectLabelsResponse = response.json().await?;
                debug!(image_key = %image_key, labels = body.labels.len(), "Detected labels");
                Ok(body.labels)
            }
            status => Err(Self::error_from_response(status, &url, response).await),
        }
    }

    /// Detect faces in an image without indexing them.
    pub async fn detect_faces(&self, image_key: &str) -> VisionResult<Vec<DetectedFace>> {
        let url = format!("{}/detect-faces", self.config.base_url);
        let response = self
            .request(&url)
            .json(&DetectRequest { image_key })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: FacesResponse = response.json().await?;
                debug!(image_key = %image_key, faces = body.faces.len(), "Detected faces");
                Ok(body.faces)
            }
            status => Err(Self::error_from_response(status, &url, response).await),
        }
    }

    /// Detect and index every face in an image into a collection.
    ///
    /// The returned faces carry the collection's native face ids and the
    /// external image id they were indexed under.
    pub async fn index_faces(
        &self,
        collection_id: &str,
        image_key: &str,
        external_image_id: &str,
    ) -> VisionResult<Vec<DetectedFace>> {
        let url = format!(
            "{}/collections/{}/index-faces",
            self.config.base_url, collection_id
        );
        let response = self
            .request(&url)
            .json(&IndexFacesRequest {
                image_key,
                external_image_id,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: FacesResponse = response.json().await?;
                info!(
                    collection_id = %collection_id,
                    image_key = %image_key,
                    faces = body.faces.len(),
                    "Indexed faces"
                );
                Ok(body.faces)
            }
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                Err(Self::map_not_found(collection_id, image_key, body))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                if status.is_server_error() {
                    Err(VisionError::ServerError(status.as_u16(), body))
                } else {
                    Err(VisionError::index_faces(image_key, body))
                }
            }
        }
    }

    /// Search a collection for faces similar to an already-indexed face.
    ///
    /// Similarity is a percentage; the caller applies its own threshold.
    pub async fn search_faces_by_id(
        &self,
        collection_id: &str,
        face_id: &str,
    ) -> VisionResult<Vec<FaceMatch>> {
        let url = format!(
            "{}/collections/{}/search-faces",
            self.config.base_url, collection_id
        );
        let response = self
            .request(&url)
            .json(&SearchFacesRequest { face_id })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: SearchFacesResponse = response.json().await?;
                debug!(
                    face_id = %face_id,
                    matches = body.matches.len(),
                    "Searched similar faces"
                );
                Ok(body.matches)
            }
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                Err(Self::map_not_found(collection_id, face_id, body))
            }
            status => Err(Self::error_from_response(status, &url, response).await),
        }
    }

    /// Distinguish a missing collection from a missing face/image.
    fn map_not_found(collection_id: &str, subject: &str, body: String) -> VisionError {
        if body.contains("collection") || body.contains("ResourceNotFound") {
            VisionError::CollectionNotFound(collection_id.to_string())
        } else {
            VisionError::request_failed(format!("{} not found: {}", subject, body))
        }
    }

    async fn error_from_response(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> VisionError {
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            VisionError::ServerError(status.as_u16(), format!("{} failed: {}", url, body))
        } else {
            VisionError::request_failed(format!("{} failed ({}): {}", url, status, body))
        }
    }
}
