//! crates/tutor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the tutor pipeline.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the database, the moderation API and the LLM provider.

use crate::domain::{AbuseLogEntry, Lesson, ModerationResult, TutorSessionLogEntry};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserLockStore: Send + Sync {
    /// Whether AI usage is currently disabled for this user.
    async fn is_user_locked(&self, user_id: Uuid) -> PortResult<bool>;
}

#[async_trait]
pub trait AbuseLogSink: Send + Sync {
    async fn log_abuse(&self, entry: AbuseLogEntry) -> PortResult<()>;
}

#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Point lookup of a lesson. `Ok(None)` when no such lesson exists.
    async fn get_lesson(&self, lesson_id: &str) -> PortResult<Option<Lesson>>;
}

#[async_trait]
pub trait ModerationService: Send + Sync {
    async fn moderate(&self, text: &str) -> PortResult<ModerationResult>;
}

/// Parameters for one call to the generative text backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait GenerativeTextService: Send + Sync {
    /// Returns the generated text for a system prompt and a user message.
    async fn complete(&self, request: CompletionRequest) -> PortResult<String>;
}

#[async_trait]
pub trait SessionLogSink: Send + Sync {
    async fn log_session(&self, entry: TutorSessionLogEntry) -> PortResult<()>;
}

/// Resolves a bearer credential to a user. Used by the HTTP layer only.
#[async_trait]
pub trait AuthSessionStore: Send + Sync {
    async fn validate_token(&self, token: &str) -> PortResult<Uuid>;
}

//=========================================================================================
// Port Call Helpers
//=========================================================================================

/// Runs a port call with an upper bound on how long it may take.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> PortResult<T>
where
    F: Future<Output = PortResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(PortError::Timeout(limit)),
    }
}

/// Awaits a non-critical port call, falling back to `default` if it fails.
///
/// Every best-effort collaborator goes through here so the fail-open policy is
/// applied (and logged) the same way everywhere.
pub async fn fail_open<T, F>(label: &'static str, default: T, call: F) -> T
where
    F: Future<Output = PortResult<T>>,
{
    match call.await {
        Ok(value) => value,
        Err(e) => {
            warn!(collaborator = label, error = %e, "Port call failed, continuing with fallback");
            default
        }
    }
}
