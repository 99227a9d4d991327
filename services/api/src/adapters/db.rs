//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! storage ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tutor_core::domain::{AbuseLogEntry, Lesson, TutorSessionLogEntry};
use tutor_core::ports::{
    AbuseLogSink, AuthSessionStore, LessonStore, PortError, PortResult, SessionLogSink,
    UserLockStore,
};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every storage port of the tutor.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    title: String,
    content: String,
    key_concepts: Vec<String>,
    summary: Option<String>,
}
impl LessonRecord {
    fn to_domain(self) -> Lesson {
        Lesson {
            id: self.id.to_string(),
            title: self.title,
            content: self.content,
            key_concepts: self.key_concepts,
            summary: self.summary,
        }
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl UserLockStore for DbAdapter {
    async fn is_user_locked(&self, user_id: Uuid) -> PortResult<bool> {
        let locked = sqlx::query_scalar::<_, bool>("SELECT ai_locked FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        // No profile row means nothing has ever locked this user.
        Ok(locked.unwrap_or(false))
    }
}

#[async_trait]
impl AbuseLogSink for DbAdapter {
    async fn log_abuse(&self, entry: AbuseLogEntry) -> PortResult<()> {
        sqlx::query("INSERT INTO ai_abuse_logs (user_id, abuse_type, severity) VALUES ($1, $2, $3)")
            .bind(entry.user_id)
            .bind(entry.abuse_type.as_str())
            .bind(entry.severity)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[async_trait]
impl LessonStore for DbAdapter {
    async fn get_lesson(&self, lesson_id: &str) -> PortResult<Option<Lesson>> {
        // Lesson ids are UUIDs; anything else cannot match a row.
        let Ok(id) = Uuid::parse_str(lesson_id) else {
            return Ok(None);
        };

        let record = sqlx::query_as::<_, LessonRecord>(
            "SELECT id, title, content, key_concepts, summary FROM lessons WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(LessonRecord::to_domain))
    }
}

#[async_trait]
impl SessionLogSink for DbAdapter {
    async fn log_session(&self, entry: TutorSessionLogEntry) -> PortResult<()> {
        let classification = serde_json::json!({
            "intent": entry.intent_classification.intent.as_str(),
            "confidence": entry.intent_classification.confidence,
            "reasoning": entry.intent_classification.reasoning,
        });

        sqlx::query(
            "INSERT INTO ai_tutor_sessions \
             (user_id, lesson_id, question, intent_classification, response, quiz_context, moderation_flags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.user_id)
        .bind(entry.lesson_id)
        .bind(entry.question)
        .bind(Json(classification))
        .bind(entry.response)
        .bind(entry.quiz_context)
        .bind(entry.moderation_flags)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

#[async_trait]
impl AuthSessionStore for DbAdapter {
    async fn validate_token(&self, token: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }
}
