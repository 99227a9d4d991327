use api_lib::web::{create_router, rest::TutorReply, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tutor_core::{
    composer::{CHEAT_REDIRECT, FOLLOW_UP_QUESTIONS, QUESTION_REQUIRED},
    AbuseLogEntry, AbuseLogSink, AuthSessionStore, CompletionRequest, GenerativeTextService,
    Lesson, LessonStore, ModerationResult, ModerationService, PortError, PortResult,
    SessionLogSink, TutorPipeline, TutorPorts, TutorSessionLogEntry, TutorSettings,
    UserLockStore,
};
use uuid::Uuid;

const TOKEN: &str = "valid-token";

//=========================================================================================
// Fake collaborators
//=========================================================================================

#[derive(Default)]
struct Counters {
    auth_checks: usize,
    lock_checks: usize,
    moderations: usize,
    completions: usize,
    abuse: Vec<AbuseLogEntry>,
    sessions: Vec<TutorSessionLogEntry>,
}

struct FakeBackend {
    user_id: Uuid,
    locked: bool,
    flagged: bool,
    lock_store_down: bool,
    counters: Mutex<Counters>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            locked: false,
            flagged: false,
            lock_store_down: false,
            counters: Mutex::new(Counters::default()),
        }
    }

    fn counters(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap()
    }
}

#[async_trait]
impl AuthSessionStore for FakeBackend {
    async fn validate_token(&self, token: &str) -> PortResult<Uuid> {
        self.counters().auth_checks += 1;
        if token == TOKEN {
            Ok(self.user_id)
        } else {
            Err(PortError::Unauthorized)
        }
    }
}

#[async_trait]
impl UserLockStore for FakeBackend {
    async fn is_user_locked(&self, _user_id: Uuid) -> PortResult<bool> {
        self.counters().lock_checks += 1;
        if self.lock_store_down {
            return Err(PortError::Unexpected("profiles unavailable".to_string()));
        }
        Ok(self.locked)
    }
}

#[async_trait]
impl AbuseLogSink for FakeBackend {
    async fn log_abuse(&self, entry: AbuseLogEntry) -> PortResult<()> {
        self.counters().abuse.push(entry);
        Ok(())
    }
}

#[async_trait]
impl LessonStore for FakeBackend {
    async fn get_lesson(&self, _lesson_id: &str) -> PortResult<Option<Lesson>> {
        Ok(None)
    }
}

#[async_trait]
impl ModerationService for FakeBackend {
    async fn moderate(&self, _text: &str) -> PortResult<ModerationResult> {
        self.counters().moderations += 1;
        Ok(ModerationResult {
            flagged: self.flagged,
            categories: if self.flagged {
                BTreeSet::from(["harassment".to_string()])
            } else {
                BTreeSet::new()
            },
        })
    }
}

#[async_trait]
impl GenerativeTextService for FakeBackend {
    async fn complete(&self, _request: CompletionRequest) -> PortResult<String> {
        self.counters().completions += 1;
        Ok("What happens to the problem size on each recursive call?".to_string())
    }
}

#[async_trait]
impl SessionLogSink for FakeBackend {
    async fn log_session(&self, entry: TutorSessionLogEntry) -> PortResult<()> {
        self.counters().sessions.push(entry);
        Ok(())
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn create_test_app(backend: &Arc<FakeBackend>) -> Router {
    let ports = TutorPorts {
        lock_store: backend.clone(),
        abuse_log: backend.clone(),
        lessons: backend.clone(),
        moderation: backend.clone(),
        generator: backend.clone(),
        session_log: backend.clone(),
    };
    let pipeline = TutorPipeline::standard(ports, TutorSettings::default()).unwrap();

    create_router(Arc::new(AppState {
        auth: backend.clone(),
        pipeline: Arc::new(pipeline),
    }))
}

fn tutor_request(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/ai-tutor")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn health_is_public() {
    let backend = Arc::new(FakeBackend::new());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(create_test_app(&backend), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "status": "ok" }));
}

#[tokio::test]
async fn missing_bearer_is_unauthorized() {
    let backend = Arc::new(FakeBackend::new());
    let (status, _) = send(
        create_test_app(&backend),
        tutor_request(None, json!({ "question": "Why?" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let counters = backend.counters();
    assert_eq!(counters.auth_checks, 0);
    assert_eq!(counters.lock_checks, 0);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let backend = Arc::new(FakeBackend::new());
    let (status, _) = send(
        create_test_app(&backend),
        tutor_request(Some("forged"), json!({ "question": "Why?" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(backend.counters().lock_checks, 0);
}

#[tokio::test]
async fn empty_question_is_bad_request_without_external_calls() {
    for body in [json!({ "question": "" }), json!({ "question": "   " }), json!({})] {
        let backend = Arc::new(FakeBackend::new());
        let (status, json) = send(create_test_app(&backend), tutor_request(Some(TOKEN), body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], QUESTION_REQUIRED);

        let counters = backend.counters();
        assert_eq!(counters.lock_checks, 0);
        assert_eq!(counters.moderations, 0);
        assert_eq!(counters.completions, 0);
        assert!(counters.sessions.is_empty());
    }
}

#[tokio::test]
async fn locked_user_gets_429() {
    let backend = Arc::new(FakeBackend {
        locked: true,
        ..FakeBackend::new()
    });
    let (status, json) = send(
        create_test_app(&backend),
        tutor_request(Some(TOKEN), json!({ "question": "Why does recursion terminate?" })),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["success"], false);
    assert_eq!(json["locked"], true);
    assert!(json.get("intent").is_none());

    let counters = backend.counters();
    assert_eq!(counters.moderations, 0);
    assert_eq!(counters.completions, 0);
    assert!(counters.abuse.is_empty());
}

#[tokio::test]
async fn cheat_attempt_is_redirected_with_200() {
    let backend = Arc::new(FakeBackend::new());
    let (status, json) = send(
        create_test_app(&backend),
        tutor_request(
            Some(TOKEN),
            json!({ "question": "What's the answer to question 3?", "quizContext": true }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reply: TutorReply = serde_json::from_value(json).unwrap();
    assert!(reply.success);
    assert_eq!(reply.intent.as_deref(), Some("cheat-attempt"));
    assert_eq!(reply.message.as_deref(), Some(CHEAT_REDIRECT));

    let counters = backend.counters();
    assert_eq!(counters.completions, 0);
    assert_eq!(counters.abuse.len(), 1);
    assert_eq!(counters.abuse[0].abuse_type.as_str(), "cheat_attempt");
    assert_eq!(counters.abuse[0].severity, 1);
    assert_eq!(counters.sessions.len(), 1);
}

#[tokio::test]
async fn learn_question_gets_guided_explanation() {
    let backend = Arc::new(FakeBackend::new());
    let (status, json) = send(
        create_test_app(&backend),
        tutor_request(
            Some(TOKEN),
            json!({ "question": "Why does this algorithm use recursion?", "lessonId": "lesson-1" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["intent"], "learn");
    assert!(!json["explanation"].as_str().unwrap().is_empty());
    let follow_up = json["followUpQuestion"].as_str().unwrap();
    assert!(FOLLOW_UP_QUESTIONS.contains(&follow_up));
    assert!(json.get("error").is_none());

    let counters = backend.counters();
    assert_eq!(counters.completions, 1);
    assert_eq!(counters.sessions.len(), 1);
    assert_eq!(counters.sessions[0].user_id, backend.user_id);
    assert_eq!(counters.sessions[0].lesson_id.as_deref(), Some("lesson-1"));
}

#[tokio::test]
async fn flagged_content_is_deflected_with_200() {
    let backend = Arc::new(FakeBackend {
        flagged: true,
        ..FakeBackend::new()
    });
    let (status, json) = send(
        create_test_app(&backend),
        tutor_request(Some(TOKEN), json!({ "question": "How do I hurt someone?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["intent"], "inappropriate");

    let counters = backend.counters();
    assert_eq!(counters.completions, 0);
    assert!(counters.sessions.is_empty());
    assert_eq!(counters.abuse.len(), 1);
    assert_eq!(counters.abuse[0].severity, 2);
}

#[tokio::test]
async fn internal_failure_is_500_with_apology() {
    let backend = Arc::new(FakeBackend {
        lock_store_down: true,
        ..FakeBackend::new()
    });
    let (status, json) = send(
        create_test_app(&backend),
        tutor_request(Some(TOKEN), json!({ "question": "How does a heap work?" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().starts_with("Sorry"));
    assert!(json["error"].as_str().unwrap().contains("profiles unavailable"));
    assert_eq!(backend.counters().moderations, 0);
}

#[tokio::test]
async fn null_quiz_context_is_treated_as_absent() {
    let backend = Arc::new(FakeBackend::new());
    let (status, json) = send(
        create_test_app(&backend),
        tutor_request(
            Some(TOKEN),
            json!({ "question": "Why?", "lessonId": null, "quizContext": null }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["intent"], "learn");

    let counters = backend.counters();
    assert_eq!(counters.sessions.len(), 1);
    assert!(!counters.sessions[0].quiz_context);
    assert_eq!(counters.sessions[0].lesson_id, None);
}

#[tokio::test]
async fn malformed_body_is_bad_request_with_structured_reply() {
    let wrong_types = serde_json::to_string(&json!({ "question": 42 })).unwrap();
    let wrong_flag = serde_json::to_string(&json!({ "question": "Why?", "quizContext": "yes" })).unwrap();

    for body in [wrong_types, wrong_flag, "{not json".to_string()] {
        let backend = Arc::new(FakeBackend::new());
        let request = Request::builder()
            .method("POST")
            .uri("/ai-tutor")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", TOKEN))
            .body(Body::from(body.clone()))
            .unwrap();
        let (status, json) = send(create_test_app(&backend), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        let reply: TutorReply = serde_json::from_value(json).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message.as_deref(), Some(QUESTION_REQUIRED));

        let counters = backend.counters();
        assert_eq!(counters.lock_checks, 0);
        assert_eq!(counters.moderations, 0);
        assert_eq!(counters.completions, 0);
    }
}
