//! crates/tutor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the tutor pipeline.
//! Everything here is request-scoped: created, used and dropped within one call.

use crate::error::TutorError;
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// A validated question from a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorRequest {
    question: String,
    lesson_id: Option<String>,
    quiz_context: bool,
}

impl TutorRequest {
    /// Builds a request, trimming the question and rejecting it if nothing is left.
    pub fn new(
        question: &str,
        lesson_id: Option<String>,
        quiz_context: bool,
    ) -> Result<Self, TutorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TutorError::EmptyQuestion);
        }

        let lesson_id = lesson_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(Self {
            question: question.to_string(),
            lesson_id,
            quiz_context,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn lesson_id(&self) -> Option<&str> {
        self.lesson_id.as_deref()
    }

    pub fn quiz_context(&self) -> bool {
        self.quiz_context
    }
}

/// The underlying goal of a student's question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Learn,
    CheatAttempt,
    General,
    /// Reserved. The standard rule table never yields it, but it is handled
    /// exactly like moderation-flagged content.
    Inappropriate,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Learn => "learn",
            Intent::CheatAttempt => "cheat-attempt",
            Intent::General => "general",
            Intent::Inappropriate => "inappropriate",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the rule table over a question.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f32,
    pub reasoning: String,
}

/// A lesson row as returned by the lesson store.
#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub content: String,
    pub key_concepts: Vec<String>,
    pub summary: Option<String>,
}

/// The slice of a lesson the composer grounds its prompt on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonContext {
    pub title: String,
    pub content: String,
    pub key_concepts: Option<Vec<String>>,
    pub summary: Option<String>,
}

impl From<Lesson> for LessonContext {
    fn from(lesson: Lesson) -> Self {
        let key_concepts = if lesson.key_concepts.is_empty() {
            None
        } else {
            Some(lesson.key_concepts)
        };
        Self {
            title: lesson.title,
            content: lesson.content,
            key_concepts,
            summary: lesson.summary,
        }
    }
}

/// Verdict of the external moderation service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationResult {
    pub flagged: bool,
    pub categories: BTreeSet<String>,
}

impl ModerationResult {
    /// The fail-open default used when moderation is unavailable.
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> Vec<String> {
        self.categories.iter().cloned().collect()
    }
}

/// The only externally observable output of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorResponse {
    pub success: bool,
    pub message: Option<String>,
    pub locked: Option<bool>,
    pub intent: Option<Intent>,
    pub explanation: Option<String>,
    pub follow_up_question: Option<String>,
    pub suggestion: Option<String>,
    pub error: Option<String>,
}

/// Kind of policy violation recorded in the abuse log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbuseType {
    CheatAttempt,
    InappropriateContent,
}

impl AbuseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbuseType::CheatAttempt => "cheat_attempt",
            AbuseType::InappropriateContent => "inappropriate_content",
        }
    }

    /// Severity written alongside the entry. Cheating is a teaching moment,
    /// inappropriate content is a violation.
    pub fn severity(&self) -> i16 {
        match self {
            AbuseType::CheatAttempt => 1,
            AbuseType::InappropriateContent => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbuseLogEntry {
    pub user_id: Uuid,
    pub abuse_type: AbuseType,
    pub severity: i16,
}

impl AbuseLogEntry {
    pub fn new(user_id: Uuid, abuse_type: AbuseType) -> Self {
        Self {
            user_id,
            abuse_type,
            severity: abuse_type.severity(),
        }
    }
}

/// Audit record of one completed tutoring exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorSessionLogEntry {
    pub user_id: Uuid,
    pub lesson_id: Option<String>,
    pub question: String,
    pub intent_classification: IntentClassification,
    pub response: String,
    pub quiz_context: bool,
    pub moderation_flags: Vec<String>,
}
