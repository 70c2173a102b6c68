//! Integration tests for lookmax-client.
//!
//! Uses wiremock to mock HTTP responses from the LookMax server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use lookmax_client::{ClientError, LookmaxClient, Screen, SessionStore, Wizard};
use lookmax_core::{
    AnalysisId, AnalysisPayload, DEFAULT_USER_ID, DataUri, FaceAnalysisRecord, MAX_UPLOAD_BYTES,
    NewFaceAnalysis, Notice, UploadError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

fn record(id: u64) -> FaceAnalysisRecord {
    FaceAnalysisRecord::from_new(
        AnalysisId(id),
        NewFaceAnalysis::new(
            DEFAULT_USER_ID,
            format!("facial-analysis-{}.jpg", id),
            AnalysisPayload::canned(),
        ),
        "2024-05-01T12:00:00.000Z",
    )
}

// =============================================================================
// CLIENT TESTS
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "version": "0.1.0"})),
        )
        .mount(&server)
        .await;

    let client = LookmaxClient::new(server.uri());
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_analyze_sends_image_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .and(body_partial_json(json!({"imageData": "data:image/png;base64,AA=="})))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = LookmaxClient::new(server.uri());
    let created = client.analyze("data:image/png;base64,AA==").await.unwrap();
    assert_eq!(created, record(1));
}

#[tokio::test]
async fn test_server_error_message_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "No image data provided"})),
        )
        .mount(&server)
        .await;

    let client = LookmaxClient::new(server.uri());
    match client.analyze("").await {
        Err(ClientError::Server { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "No image data provided");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_analysis_and_delete_map_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyses/5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Analysis not found"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/analyses/5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Analysis not found"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/analyses/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Analysis deleted successfully"})),
        )
        .mount(&server)
        .await;

    let client = LookmaxClient::new(server.uri());
    assert!(client.analysis(AnalysisId(5)).await.unwrap().is_none());
    assert!(!client.delete(AnalysisId(5)).await.unwrap());
    assert!(client.delete(AnalysisId(1)).await.unwrap());
}

#[tokio::test]
async fn test_list_analyses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![record(1), record(2)]))
        .mount(&server)
        .await;

    let client = LookmaxClient::new(server.uri());
    let list = client.analyses().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].id, AnalysisId(2));
}

#[tokio::test]
async fn test_api_key_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyses"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<FaceAnalysisRecord>::new()))
        .expect(1)
        .mount(&server)
        .await;

    let client = LookmaxClient::with_api_key(server.uri(), "s3cret").unwrap();
    assert!(client.analyses().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_file_checks_size_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(1)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let big = dir.path().join("big.jpg");
    std::fs::write(&big, vec![0u8; MAX_UPLOAD_BYTES + 1]).unwrap();
    let small = dir.path().join("face.jpg");
    std::fs::write(&small, vec![0xFF, 0xD8, 0xFF]).unwrap();

    let client = LookmaxClient::new(server.uri());
    assert!(matches!(
        client.analyze_file(&big).await,
        Err(ClientError::Upload(_))
    ));
    assert_eq!(client.analyze_file(&small).await.unwrap(), record(1));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["imageData"], "data:image/jpeg;base64,/9j/");
}

#[tokio::test]
async fn test_analyze_data_uri_checks_decoded_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(1)))
        .expect(2)
        .mount(&server)
        .await;

    let client = LookmaxClient::new(server.uri());

    let base64 = "data:image/png;base64,AA==";
    assert_eq!(client.analyze_data_uri(base64).await.unwrap(), record(1));

    let percent = "data:image/svg+xml,%3Csvg%2F%3E";
    assert_eq!(client.analyze_data_uri(percent).await.unwrap(), record(1));

    let big = DataUri::new("image/jpeg", vec![0u8; MAX_UPLOAD_BYTES + 1]).encode();
    assert!(matches!(
        client.analyze_data_uri(&big).await,
        Err(ClientError::Upload(UploadError::TooLarge { .. }))
    ));
    assert!(matches!(
        client.analyze_data_uri("data:image/png;base64").await,
        Err(ClientError::Upload(UploadError::MalformedDataUri(_)))
    ));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(body["imageData"], percent);
}

// =============================================================================
// WIZARD OVER HTTP
// =============================================================================

#[tokio::test]
async fn test_wizard_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(3)))
        .mount(&server)
        .await;

    let session = SessionStore::new();
    session.set_captured_image("data:image/jpeg;base64,/9j/");
    let mut wizard = Wizard::new(LookmaxClient::new(server.uri()), session.clone());

    let payload = wizard.enter_analysis(None).await.unwrap();
    assert_eq!(payload, AnalysisPayload::canned());
    assert_eq!(wizard.enter_ratings().unwrap()[0].category, "Overall");
    assert_eq!(wizard.screen(), Screen::Ratings);
}

#[tokio::test]
async fn test_wizard_server_failure_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Failed to analyze face"})),
        )
        .mount(&server)
        .await;

    let session = SessionStore::new();
    let mut wizard = Wizard::new(LookmaxClient::new(server.uri()), session);
    let redirect = wizard
        .enter_analysis(Some("data:image/jpeg;base64,/9j/"))
        .await
        .unwrap_err();
    assert_eq!(redirect.to, Screen::Scan);
    assert_eq!(redirect.notice, Notice::analysis_failed());
}
