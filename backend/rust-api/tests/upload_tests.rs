use axum::http::StatusCode;
use neuralsync_api::services::{gemini::GatewayError, repository::Repository};
use std::sync::atomic::Ordering;

mod common;

#[tokio::test]
async fn test_document_upload_stores_analysis_and_concept_map() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "document", None).await;

    let (status, json) =
        common::upload(&app.router, &session_id, "biology.pdf", b"%PDF-1.4 photosynthesis").await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["success"], true);
    assert_eq!(
        json["analysis"]["summary"],
        "Photosynthesis turns light into chemical energy"
    );
    assert!(json.get("is_cached").is_none());
    assert!(json.get("is_mock").is_none());

    let uploads = app.repository.uploads_for(&session_id).await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].id, json["upload_id"].as_str().unwrap());
    assert!(uploads[0].analysis_completed);
    assert_eq!(uploads[0].key_concepts.len(), 2);

    let maps = app.repository.list_concept_maps(&session_id).await.unwrap();
    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0].nodes.len(), 1);
}

#[tokio::test]
async fn test_staged_file_is_removed_after_analysis() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "video", None).await;

    let (status, _) = common::upload(&app.router, &session_id, "lecture.mp4", b"fake video").await;
    assert_eq!(status, StatusCode::OK);

    let staged = app.gateway.staged();
    assert_eq!(staged.len(), 1);
    let (path, existed) = &staged[0];
    assert!(existed, "file must exist while the model reads it");
    assert!(!path.exists(), "staged file must be gone after the request");
}

#[tokio::test]
async fn test_identical_upload_reuses_cached_analysis() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "problem", None).await;

    let (status, first) = common::upload(&app.router, &session_id, "algebra.png", b"pixels").await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = common::upload(&app.router, &session_id, "algebra.png", b"pixels").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["is_cached"], true);
    assert_eq!(second["analysis"], first["analysis"]);
    assert_ne!(second["upload_id"], first["upload_id"]);

    assert_eq!(app.gateway.analyses.load(Ordering::SeqCst), 1);
    assert_eq!(app.repository.uploads_for(&session_id).await.len(), 2);
}

#[tokio::test]
async fn test_upload_rejects_unsupported_extension() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "document", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "virus.exe", b"MZ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Unsupported file type"));
    assert_eq!(app.gateway.analyses.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "document", None).await;

    let body = common::multipart_body(&[("session_id", &session_id)], None);
    let (status, json) = common::send_multipart(&app.router, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn test_upload_to_unknown_session_is_404() {
    let app = common::create_test_app();

    let (status, json) = common::upload(&app.router, "missing-session", "notes.pdf", b"x").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Session not found");
}

#[tokio::test]
async fn test_upload_kind_must_match_session_mode() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "video", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "notes.pdf", b"x").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("cannot analyze"));
    assert!(app.repository.uploads_for(&session_id).await.is_empty());
}

#[tokio::test]
async fn test_overloaded_model_serves_mock_for_demo_file() {
    let gateway = common::ScriptedGateway::default().with_analysis(Err(common::overloaded()));
    let app = common::create_test_app_with(gateway);
    let session_id = common::create_session(&app.router, "document", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "demo_rapport.pdf", b"x").await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["is_mock"], true);
    assert!(json["analysis"]["summary"].is_string());

    let uploads = app.repository.uploads_for(&session_id).await;
    assert!(uploads[0].analysis_completed);
}

#[tokio::test]
async fn test_mock_analysis_is_not_reused_once_the_model_recovers() {
    let gateway = common::ScriptedGateway::default().with_analysis(Err(common::overloaded()));
    let app = common::create_test_app_with(gateway);

    let first_session = common::create_session(&app.router, "document", None).await;
    let (status, first) =
        common::upload(&app.router, &first_session, "demo_notes.pdf", b"%PDF demo").await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["is_mock"], true);
    assert!(app.repository.uploads_for(&first_session).await[0].is_mock);

    app.gateway
        .set_analysis(Ok(serde_json::json!({"summary": "REAL", "main_topics": ["cells"]})));

    let second_session = common::create_session(&app.router, "document", None).await;
    let (status, second) =
        common::upload(&app.router, &second_session, "demo_notes.pdf", b"%PDF demo").await;

    assert_eq!(status, StatusCode::OK, "{}", second);
    assert_eq!(second["analysis"]["summary"], "REAL");
    assert!(second.get("is_cached").is_none());
    assert!(second.get("is_mock").is_none());
    assert_eq!(app.gateway.analyses.load(Ordering::SeqCst), 2);

    let stored = app.repository.uploads_for(&second_session).await;
    assert!(stored[0].analysis_completed);
    assert!(!stored[0].is_mock);

    let (_, third) =
        common::upload(&app.router, &second_session, "demo_notes.pdf", b"%PDF demo").await;
    assert_eq!(third["is_cached"], true);
    assert_eq!(third["analysis"]["summary"], "REAL");
}

#[tokio::test]
async fn test_overloaded_model_fails_for_regular_file() {
    let gateway = common::ScriptedGateway::default().with_analysis(Err(common::overloaded()));
    let app = common::create_test_app_with(gateway);
    let session_id = common::create_session(&app.router, "video", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "lecture.mp4", b"x").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "MODEL_OVERLOADED");
}

#[tokio::test]
async fn test_overloaded_model_fails_for_non_demo_image() {
    let gateway = common::ScriptedGateway::default().with_analysis(Err(common::overloaded()));
    let app = common::create_test_app_with(gateway);
    let session_id = common::create_session(&app.router, "problem", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "photo1.jpg", b"jpeg").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "MODEL_OVERLOADED");
    assert!(json.get("is_mock").is_none());
    assert!(json.get("analysis").is_none());

    let uploads = app.repository.uploads_for(&session_id).await;
    assert_eq!(uploads.len(), 1);
    assert!(!uploads[0].analysis_completed);
    assert!(!uploads[0].is_mock);
}

#[tokio::test]
async fn test_quota_exhaustion_maps_to_429() {
    let gateway = common::ScriptedGateway::default().with_analysis(Err(GatewayError::Api {
        http_status: 429,
        provider_status: Some("RESOURCE_EXHAUSTED".to_string()),
        reason: None,
        message: "Quota exceeded".to_string(),
    }));
    let app = common::create_test_app_with(gateway);
    let session_id = common::create_session(&app.router, "creative", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "painting.jpg", b"x").await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], "QUOTA_EXHAUSTED");
}

#[tokio::test]
async fn test_malformed_model_output_is_not_mocked() {
    let gateway = common::ScriptedGateway::default().with_analysis(Err(
        GatewayError::InvalidResponse("reply is not a JSON object".to_string()),
    ));
    let app = common::create_test_app_with(gateway);
    let session_id = common::create_session(&app.router, "document", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "test.pdf", b"x").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json.get("is_mock").is_none());
    let uploads = app.repository.uploads_for(&session_id).await;
    assert!(!uploads[0].analysis_completed);
}

#[tokio::test]
async fn test_unconfigured_ai_reports_error() {
    let gateway =
        common::ScriptedGateway::unconfigured().with_analysis(Err(GatewayError::NotConfigured));
    let app = common::create_test_app_with(gateway);
    let session_id = common::create_session(&app.router, "document", None).await;

    let (status, json) = common::upload(&app.router, &session_id, "notes.pdf", b"x").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
}
