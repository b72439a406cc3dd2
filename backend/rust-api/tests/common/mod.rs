#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use neuralsync_api::{
    config::{Config, StorageBackend},
    create_router,
    models::{answer::AnswerEvaluation, practice::PracticeProblem},
    services::{
        gemini::{AiGateway, ChatHandle, GatewayError},
        repository::MemoryRepository,
        staging::StagedUpload,
        AppState,
    },
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "neuralsync-test-boundary";

/// Gateway double returning whatever the test scripted for each operation.
pub struct ScriptedGateway {
    configured: bool,
    analysis: Mutex<Result<Value, GatewayError>>,
    reply: Mutex<Result<String, GatewayError>>,
    evaluation: Mutex<Result<AnswerEvaluation, GatewayError>>,
    problems: Mutex<Result<Vec<PracticeProblem>, GatewayError>>,
    difficulty: Mutex<Result<Value, GatewayError>>,
    pub sessions_started: AtomicUsize,
    pub analyses: AtomicUsize,
    contexts: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
    staged: Mutex<Vec<(PathBuf, bool)>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            configured: true,
            analysis: Mutex::new(Ok(json!({
                "summary": "Photosynthesis turns light into chemical energy",
                "key_concepts": ["chlorophyll", "light reactions"],
                "concept_map": {
                    "nodes": [{"id": "n1", "label": "chlorophyll"}],
                    "edges": []
                }
            }))),
            reply: Mutex::new(Ok("Think about where the energy comes from.".to_string())),
            evaluation: Mutex::new(Ok(AnswerEvaluation {
                is_correct: true,
                correctness_percentage: 100.0,
                feedback: "Exactly right.".to_string(),
                what_was_good: Value::Null,
                what_to_improve: Value::Null,
                hint_for_next_time: Value::Null,
                encouragement: Value::Null,
            })),
            problems: Mutex::new(Ok(vec![PracticeProblem {
                id: Some(1),
                problem: "What is 1/2 + 1/4?".to_string(),
                kind: "short_answer".to_string(),
                options: Vec::new(),
                solution: "3/4".to_string(),
                hints: vec!["Use a common denominator".to_string()],
                learning_objective: "Add fractions".to_string(),
            }])),
            difficulty: Mutex::new(Ok(json!({
                "recommended_level": "hard",
                "reasoning": "Accuracy is consistently high",
                "focus_areas": ["word problems"]
            }))),
            sessions_started: AtomicUsize::new(0),
            analyses: AtomicUsize::new(0),
            contexts: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            staged: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGateway {
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::default()
        }
    }

    pub fn with_analysis(self, result: Result<Value, GatewayError>) -> Self {
        *self.analysis.lock().unwrap() = result;
        self
    }

    pub fn with_reply(self, result: Result<String, GatewayError>) -> Self {
        *self.reply.lock().unwrap() = result;
        self
    }

    pub fn with_evaluation(self, result: Result<AnswerEvaluation, GatewayError>) -> Self {
        *self.evaluation.lock().unwrap() = result;
        self
    }

    pub fn with_problems(self, result: Result<Vec<PracticeProblem>, GatewayError>) -> Self {
        *self.problems.lock().unwrap() = result;
        self
    }

    pub fn set_reply(&self, result: Result<String, GatewayError>) {
        *self.reply.lock().unwrap() = result;
    }

    pub fn set_analysis(&self, result: Result<Value, GatewayError>) {
        *self.analysis.lock().unwrap() = result;
    }

    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Staged file paths seen by analysis calls, with whether each existed at the time.
    pub fn staged(&self) -> Vec<(PathBuf, bool)> {
        self.staged.lock().unwrap().clone()
    }

    fn analyze(&self, file: &StagedUpload) -> Result<Value, GatewayError> {
        self.analyses.fetch_add(1, Ordering::SeqCst);
        self.staged
            .lock()
            .unwrap()
            .push((file.path().to_path_buf(), file.path().exists()));
        self.analysis.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiGateway for ScriptedGateway {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn analyze_video(&self, file: &StagedUpload, _context: &str) -> Result<Value, GatewayError> {
        self.analyze(file)
    }

    async fn analyze_image_problem(
        &self,
        file: &StagedUpload,
        _subject_hint: &str,
    ) -> Result<Value, GatewayError> {
        self.analyze(file)
    }

    async fn analyze_document(
        &self,
        file: &StagedUpload,
        _focus_areas: &str,
    ) -> Result<Value, GatewayError> {
        self.analyze(file)
    }

    async fn creative_workshop(
        &self,
        file: &StagedUpload,
        _creative_goal: &str,
    ) -> Result<Value, GatewayError> {
        self.analyze(file)
    }

    async fn start_interactive_session(
        &self,
        context: &str,
        _user_level: &str,
    ) -> Result<ChatHandle, GatewayError> {
        self.sessions_started.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().unwrap().push(context.to_string());
        Ok(ChatHandle::new(context))
    }

    async fn send_message(
        &self,
        chat: Option<&ChatHandle>,
        message: &str,
    ) -> Result<String, GatewayError> {
        if chat.is_none() {
            return Err(GatewayError::NoActiveSession);
        }
        self.messages.lock().unwrap().push(message.to_string());
        self.reply.lock().unwrap().clone()
    }

    async fn evaluate_answer(
        &self,
        _question: &str,
        _user_answer: &str,
        _correct_answer: &str,
        _context: &str,
    ) -> Result<AnswerEvaluation, GatewayError> {
        self.evaluation.lock().unwrap().clone()
    }

    async fn generate_practice_problems(
        &self,
        _topic: &str,
        _difficulty: &str,
        count: u32,
    ) -> Result<Vec<PracticeProblem>, GatewayError> {
        self.problems
            .lock()
            .unwrap()
            .clone()
            .map(|problems| problems.into_iter().take(count as usize).collect())
    }

    async fn suggest_difficulty(&self, _user_stats: &Value) -> Result<Value, GatewayError> {
        self.difficulty.lock().unwrap().clone()
    }
}

pub fn overloaded() -> GatewayError {
    GatewayError::Api {
        http_status: 503,
        provider_status: Some("UNAVAILABLE".to_string()),
        reason: None,
        message: "The model is overloaded. Please try again later.".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub repository: Arc<MemoryRepository>,
    pub gateway: Arc<ScriptedGateway>,
}

pub fn test_config() -> Config {
    let mut config = Config {
        storage_backend: StorageBackend::Memory,
        ..Config::default()
    };
    config.uploads.dir = std::env::temp_dir().join(format!("neuralsync-tests-{}", Uuid::new_v4()));
    config
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(ScriptedGateway::default())
}

pub fn create_test_app_with(gateway: ScriptedGateway) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let repository = Arc::new(MemoryRepository::new());
    let gateway = Arc::new(gateway);
    let state = Arc::new(AppState::with_components(
        test_config(),
        repository.clone(),
        gateway.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        repository,
        gateway,
    }
}

async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!(
                "non-JSON body with status {}: {}",
                status,
                String::from_utf8_lossy(&body)
            )
        })
    };
    (status, json)
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    into_json(response).await
}

pub async fn send_empty(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    into_json(response).await
}

/// Creates a session through the API and returns its id.
pub async fn create_session(app: &Router, mode: &str, user_id: Option<&str>) -> String {
    let mut body = json!({ "mode": mode, "title": format!("{} test", mode) });
    if let Some(user_id) = user_id {
        body["user_id"] = json!(user_id);
    }
    let (status, json) = send_json(app, "POST", "/api/session/create/", body).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
    json["session_id"].as_str().unwrap().to_string()
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn send_multipart(app: &Router, body: Vec<u8>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    into_json(response).await
}

pub async fn upload(
    app: &Router,
    session_id: &str,
    filename: &str,
    bytes: &[u8],
) -> (StatusCode, Value) {
    let body = multipart_body(
        &[("session_id", session_id), ("context", "focus on the basics")],
        Some((filename, bytes)),
    );
    send_multipart(app, body).await
}
