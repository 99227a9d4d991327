//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use tutor_core::{TutorOutcome, TutorRequest, TutorResponse};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        ask_tutor_handler,
        health_handler,
    ),
    components(
        schemas(AskTutorRequest, TutorReply, HealthResponse)
    ),
    tags(
        (name = "AI Tutor API", description = "Guided tutoring for students, with anti-cheat and moderation guardrails.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A student's question to the tutor.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskTutorRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub lesson_id: Option<String>,
    /// True while the student is taking a quiz. `null` counts as false.
    #[serde(default)]
    pub quiz_context: Option<bool>,
}

/// The tutor's reply. Absent fields are omitted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TutorReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// One of `learn`, `cheat-attempt`, `general`, `inappropriate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TutorResponse> for TutorReply {
    fn from(response: TutorResponse) -> Self {
        Self {
            success: response.success,
            message: response.message,
            locked: response.locked,
            intent: response.intent.map(|intent| intent.as_str().to_string()),
            explanation: response.explanation,
            follow_up_question: response.follow_up_question,
            suggestion: response.suggestion,
            error: response.error,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Ask the AI tutor a question.
///
/// Requires an `Authorization: Bearer <token>` header.
#[utoipa::path(
    post,
    path = "/ai-tutor",
    request_body = AskTutorRequest,
    responses(
        (status = 200, description = "Question handled (answered, redirected or deflected)", body = TutorReply),
        (status = 400, description = "Question missing or empty, or the body is not valid JSON", body = TutorReply),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 429, description = "AI tutor access is locked for this user", body = TutorReply),
        (status = 500, description = "Internal server error", body = TutorReply)
    )
)]
pub async fn ask_tutor_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<AskTutorRequest>, JsonRejection>,
) -> (StatusCode, Json<TutorReply>) {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(%user_id, "Malformed tutor request body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(TutorResponse::question_required().into()),
            );
        }
    };

    let request = match TutorRequest::new(
        payload.question.as_deref().unwrap_or_default(),
        payload.lesson_id,
        payload.quiz_context.unwrap_or(false),
    ) {
        Ok(request) => request,
        Err(e) => {
            warn!(%user_id, "Rejected tutor request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(TutorResponse::question_required().into()),
            );
        }
    };

    match app_state.pipeline.handle(user_id, &request).await {
        Ok(TutorOutcome::Locked(response)) => {
            (StatusCode::TOO_MANY_REQUESTS, Json(response.into()))
        }
        Ok(TutorOutcome::Handled(response)) => (StatusCode::OK, Json(response.into())),
        Err(e) => {
            error!(%user_id, "AI tutor request failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TutorResponse::internal_error(e.to_string()).into()),
            )
        }
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
