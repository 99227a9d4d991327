pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::{ask_tutor_handler, health_handler};

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use state::AppState;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;
use tutor_core::TutorResponse;

/// Builds the API router. Shared by the binary and the integration tests.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/ai-tutor", post(ask_tutor_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(app_state)
}

/// Turns a panic inside a handler into the same 500 body as any other failure.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", detail);

    let body: rest::TutorReply = TutorResponse::internal_error(detail).into();
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
