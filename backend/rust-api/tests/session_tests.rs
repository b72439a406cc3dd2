use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use neuralsync_api::{
    create_router,
    models::{
        concept_map::ConceptMap,
        content::{AnalysisRecord, UploadedContent},
        interaction::Interaction,
        progress::{ProgressDelta, UserProgress},
        CounterDelta, LearningSession, SessionMode,
    },
    services::{
        repository::{MemoryRepository, Repository},
        AppState,
    },
};
use serde_json::json;
use tokio::sync::Barrier;

mod common;

/// Holds the first `parties` session reads until all of them have arrived, so
/// concurrent requests observe the same state before either writes.
struct LockstepRepository {
    inner: Arc<MemoryRepository>,
    barrier: Barrier,
    parties: usize,
    reads: AtomicUsize,
}

impl LockstepRepository {
    fn new(inner: Arc<MemoryRepository>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Repository for LockstepRepository {
    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn insert_session(&self, session: &LearningSession) -> Result<()> {
        self.inner.insert_session(session).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<LearningSession>> {
        let session = self.inner.get_session(session_id).await?;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        Ok(session)
    }

    async fn increment_counters(&self, session_id: &str, delta: CounterDelta) -> Result<bool> {
        self.inner.increment_counters(session_id, delta).await
    }

    async fn complete_session(
        &self,
        session_id: &str,
        duration_seconds: u32,
    ) -> Result<Option<LearningSession>> {
        self.inner.complete_session(session_id, duration_seconds).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        self.inner.delete_session(session_id).await
    }

    async fn insert_upload(&self, upload: &UploadedContent) -> Result<()> {
        self.inner.insert_upload(upload).await
    }

    async fn complete_upload_analysis(
        &self,
        upload_id: &str,
        record: &AnalysisRecord,
    ) -> Result<()> {
        self.inner.complete_upload_analysis(upload_id, record).await
    }

    async fn latest_completed_upload(&self, session_id: &str) -> Result<Option<UploadedContent>> {
        self.inner.latest_completed_upload(session_id).await
    }

    async fn find_cached_analysis(
        &self,
        filename: &str,
        file_size: i64,
        mode: SessionMode,
        exclude_id: &str,
    ) -> Result<Option<UploadedContent>> {
        self.inner
            .find_cached_analysis(filename, file_size, mode, exclude_id)
            .await
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        self.inner.insert_interaction(interaction).await
    }

    async fn list_interactions(&self, session_id: &str) -> Result<Vec<Interaction>> {
        self.inner.list_interactions(session_id).await
    }

    async fn insert_concept_map(&self, map: &ConceptMap) -> Result<()> {
        self.inner.insert_concept_map(map).await
    }

    async fn list_concept_maps(&self, session_id: &str) -> Result<Vec<ConceptMap>> {
        self.inner.list_concept_maps(session_id).await
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        self.inner.get_progress(user_id).await
    }

    async fn add_progress(&self, user_id: &str, delta: ProgressDelta) -> Result<()> {
        self.inner.add_progress(user_id, delta).await
    }

    async fn set_preferred_difficulty(&self, user_id: &str, level: &str) -> Result<bool> {
        self.inner.set_preferred_difficulty(user_id, level).await
    }
}

#[tokio::test]
async fn test_create_session_returns_id_and_message() {
    let app = common::create_test_app();

    let (status, json) = common::send_json(
        &app.router,
        "POST",
        "/api/session/create/",
        json!({ "mode": "video", "title": "Cell biology" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Learning session created");

    let session_id = json["session_id"].as_str().unwrap();
    let stored = app.repository.get_session(session_id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Cell biology");
    assert_eq!(stored.questions_asked, 0);
    assert!(!stored.completed);
}

#[tokio::test]
async fn test_create_session_defaults_title() {
    let app = common::create_test_app();

    let (status, json) = common::send_json(
        &app.router,
        "POST",
        "/api/session/create/",
        json!({ "mode": "document" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let session_id = json["session_id"].as_str().unwrap();
    let stored = app.repository.get_session(session_id).await.unwrap().unwrap();
    assert_eq!(stored.title, "New document session");
}

#[tokio::test]
async fn test_create_session_rejects_unknown_mode() {
    let app = common::create_test_app();

    let (status, json) = common::send_json(
        &app.router,
        "POST",
        "/api/session/create/",
        json!({ "mode": "karaoke" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_create_session_rejects_malformed_json() {
    let app = common::create_test_app();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/session/create/")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_of_fresh_session() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "problem", None).await;

    let (status, json) = common::send_empty(
        &app.router,
        "GET",
        &format!("/api/session/{}/stats/", session_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let stats = &json["stats"];
    assert_eq!(stats["mode"], "problem");
    assert_eq!(stats["questions_asked"], 0);
    assert_eq!(stats["correct_answers"], 0);
    assert_eq!(stats["hints_used"], 0);
    assert_eq!(stats["accuracy_rate"], 0.0);
    assert_eq!(stats["completed"], false);
}

#[tokio::test]
async fn test_stats_of_unknown_session_is_404() {
    let app = common::create_test_app();

    let (status, json) =
        common::send_empty(&app.router, "GET", "/api/session/does-not-exist/stats/").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Session not found");
}

#[tokio::test]
async fn test_complete_session_is_idempotent_and_updates_progress() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "video", Some("learner-1")).await;

    let (status, json) = common::send_json(
        &app.router,
        "POST",
        "/api/ask/",
        json!({ "session_id": session_id, "question": "What is a cell?" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", json);

    let uri = format!("/api/session/{}/complete/", session_id);
    let (status, first) = common::send_empty(&app.router, "POST", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["stats"]["completed"], true);
    assert_eq!(first["stats"]["questions_asked"], 1);

    let (status, second) = common::send_empty(&app.router, "POST", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["stats"]["completed"], true);

    let progress = app.repository.get_progress("learner-1").await.unwrap().unwrap();
    assert_eq!(progress.total_sessions, 1);
    assert_eq!(progress.total_questions, 1);
    assert!(app.state.chats.get(&session_id).await.is_none());
}

#[tokio::test]
async fn test_concurrent_completions_count_the_session_once() {
    let memory = Arc::new(MemoryRepository::new());
    let mut session =
        LearningSession::new(SessionMode::Problem, "Fractions".into(), Some("learner-2".into()));
    session.questions_asked = 3;
    session.correct_answers = 2;
    memory.insert_session(&session).await.unwrap();

    let repository = Arc::new(LockstepRepository::new(memory.clone(), 2));
    let state = Arc::new(AppState::with_components(
        common::test_config(),
        repository,
        Arc::new(common::ScriptedGateway::default()),
    ));
    let router = create_router(state);

    let uri = format!("/api/session/{}/complete/", session.id);
    let ((first_status, first), (second_status, second)) = tokio::join!(
        common::send_empty(&router, "POST", &uri),
        common::send_empty(&router, "POST", &uri),
    );

    assert_eq!(first_status, StatusCode::OK, "{}", first);
    assert_eq!(second_status, StatusCode::OK, "{}", second);
    assert_eq!(first["stats"]["completed"], true);
    assert_eq!(second["stats"]["completed"], true);

    let progress = memory.get_progress("learner-2").await.unwrap().unwrap();
    assert_eq!(progress.total_sessions, 1);
    assert_eq!(progress.total_questions, 3);
    assert_eq!(progress.total_correct, 2);
}

#[tokio::test]
async fn test_complete_unknown_session_is_404() {
    let app = common::create_test_app();

    let (status, _) =
        common::send_empty(&app.router, "POST", "/api/session/missing/complete/").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session_cascades() {
    let app = common::create_test_app();
    let session_id = common::create_session(&app.router, "document", None).await;

    let (status, _) = common::upload(&app.router, &session_id, "notes.pdf", b"%PDF-1.4 body").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = common::send_json(
        &app.router,
        "POST",
        "/api/ask/",
        json!({ "session_id": session_id, "question": "Summarize page one" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/session/{}/", session_id);
    let (status, json) = common::send_empty(&app.router, "DELETE", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    assert!(app.repository.get_session(&session_id).await.unwrap().is_none());
    assert!(app.repository.uploads_for(&session_id).await.is_empty());
    assert!(app
        .repository
        .list_interactions(&session_id)
        .await
        .unwrap()
        .is_empty());
    assert!(app
        .repository
        .list_concept_maps(&session_id)
        .await
        .unwrap()
        .is_empty());

    let (status, _) = common::send_empty(&app.router, "DELETE", &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_degraded_without_ai_key() {
    let app = common::create_test_app_with(common::ScriptedGateway::unconfigured());

    let (status, json) = common::send_empty(&app.router, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["dependencies"]["storage"]["status"], "healthy");
    assert_eq!(json["dependencies"]["ai"]["status"], "not_configured");
}

#[tokio::test]
async fn test_health_is_healthy_when_configured() {
    let app = common::create_test_app();

    let (status, json) = common::send_empty(&app.router, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "neuralsync-api");
}

#[tokio::test]
async fn test_responses_carry_trace_id() {
    let app = common::create_test_app();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .uri("/health")
            .header("x-trace-id", "trace-abc")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-trace-id"], "trace-abc");
}
