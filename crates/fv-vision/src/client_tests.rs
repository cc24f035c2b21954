//! Tests for vision client HTTP behavior.

use std::time::Duration;

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{VisionClient, VisionConfig};
use crate::error::VisionError;

fn mock_client(server: &MockServer) -> VisionClient {
    VisionClient::new(VisionConfig {
        base_url: server.uri(),
        api_key: None,
        timeout: Duration::from_secs(5),
    })
    .expect("client should build")
}

#[tokio::test]
async fn test_create_collection_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections"))
        .and(body_json(serde_json::json!({ "collection_id": "family" })))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    client.create_collection("family").await.unwrap();
}

#[tokio::test]
async fn test_create_collection_conflict_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections"))
        .respond_with(ResponseTemplate::new(409).set_body_string("collection already exists"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    client.create_collection("family").await.unwrap();
}

#[tokio::test]
async fn test_detect_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect-labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "labels": [
                { "name": "Tree", "confidence": 98.2 },
                { "name": "Beach", "confidence": 77.0 }
            ]
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let labels = client.detect_labels("lucy/photo.jpg").await.unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels[0].name, "Tree");
}

#[tokio::test]
async fn test_index_faces_returns_detected_faces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections/family/index-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "faces": [
                {
                    "face_id": "f1",
                    "external_image_id": "img-1",
                    "bounding_box": { "top": 0.2, "left": 0.2, "width": 0.3, "height": 0.5 },
                    "landmarks": [ { "x": 0.25, "y": 0.3 } ]
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let faces = client
        .index_faces("family", "lucy/photo.jpg", "img-1")
        .await
        .unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].face_id, "f1");
    assert_eq!(faces[0].external_image_id, "img-1");
}

#[tokio::test]
async fn test_index_faces_missing_collection_is_detectable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections/family/index-faces"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("ResourceNotFound: collection 'family' does not exist"),
        )
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = client
        .index_faces("family", "lucy/photo.jpg", "img-1")
        .await
        .unwrap_err();
    assert!(err.is_collection_not_found());
}

#[tokio::test]
async fn test_index_faces_client_error_carries_image_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections/family/index-faces"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unsupported image format"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = client
        .index_faces("family", "lucy/photo.bmp", "img-1")
        .await
        .unwrap_err();

    match err {
        VisionError::IndexFaces { image_key, message } => {
            assert_eq!(image_key, "lucy/photo.bmp");
            assert!(message.contains("unsupported"));
        }
        other => panic!("expected IndexFaces error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_faces_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections/family/search-faces"))
        .and(body_json(serde_json::json!({ "face_id": "f1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [
                { "face_id": "f2", "similarity": 91.5 },
                { "face_id": "f3", "similarity": 64.2 }
            ]
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let matches = client.search_faces_by_id("family", "f1").await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].face_id, "f2");
    assert!((matches[0].similarity - 91.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_server_error_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect-labels"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = client.detect_labels("lucy/photo.jpg").await.unwrap_err();
    assert!(matches!(err, VisionError::ServerError(503, _)));
}
