//! crates/tutor_core/src/composer.rs
//!
//! Builds every response the tutor can give, including the guided explanation
//! produced by the generative backend.

use crate::domain::{Intent, LessonContext, TutorResponse};
use crate::ports::{with_timeout, CompletionRequest, GenerativeTextService};
use rand::seq::IndexedRandom;
use std::time::Duration;
use tracing::{info, warn};

pub const LOCKOUT_MESSAGE: &str = "Your AI tutor access has been temporarily locked because of repeated policy violations. Please contact your instructor to restore access.";

pub const MODERATION_DEFLECTION: &str = "I'm here to help you learn, but I can't respond to that. Let's keep our conversation focused on your course material. What would you like to understand better?";

pub const CHEAT_REDIRECT: &str = "I can't give you the answer directly, but I can help you work it out! What do you already know about this topic? Let's break the problem down together, step by step.";

pub const CHEAT_SUGGESTION: &str = "Try asking about the concept behind the question, for example \"How does this work?\" or \"Why is this approach used?\"";

pub const DEGRADED_EXPLANATION: &str = "I'm having trouble putting together a good explanation right now. Could you rephrase your question or make it a bit more specific?";

pub const DEGRADED_SUGGESTION: &str = "Try breaking your question into smaller parts and asking about one at a time.";

pub const CLARIFY_SUGGESTION: &str = "Feel free to ask me to clarify anything or to explain it a different way.";

pub const GENERIC_APOLOGY: &str = "Sorry, something went wrong while processing your question. Please try again in a moment.";

pub const QUESTION_REQUIRED: &str = "Question is required";

/// Generic critical-thinking prompts appended to every guided explanation.
pub const FOLLOW_UP_QUESTIONS: &[&str] = &[
    "What do you think would happen if one of the variables changed?",
    "Can you think of a real-world example where this applies?",
    "How would you explain this idea to a classmate in your own words?",
    "What part of this still feels unclear to you?",
    "How does this connect to what you learned earlier in the course?",
];

const TUTOR_POLICY: &str = "You are a patient, encouraging tutor on an online learning platform.

Rules:
- Guide the student toward understanding. Never give direct answers to assignment, quiz or exam questions.
- Ask probing questions that help the student reason it out themselves.
- Be encouraging and supportive.
- Keep responses concise: a few short paragraphs at most.";

/// Characters of lesson content embedded in the prompt.
pub const LESSON_EXCERPT_CHARS: usize = 500;
pub const MAX_OUTPUT_TOKENS: u32 = 500;
pub const TEMPERATURE: f32 = 0.7;

impl TutorResponse {
    fn empty(success: bool) -> Self {
        Self {
            success,
            message: None,
            locked: None,
            intent: None,
            explanation: None,
            follow_up_question: None,
            suggestion: None,
            error: None,
        }
    }

    pub fn locked() -> Self {
        Self {
            message: Some(LOCKOUT_MESSAGE.to_string()),
            locked: Some(true),
            ..Self::empty(false)
        }
    }

    pub fn moderation_deflection() -> Self {
        Self {
            message: Some(MODERATION_DEFLECTION.to_string()),
            intent: Some(Intent::Inappropriate),
            ..Self::empty(false)
        }
    }

    pub fn cheat_redirect() -> Self {
        Self {
            message: Some(CHEAT_REDIRECT.to_string()),
            suggestion: Some(CHEAT_SUGGESTION.to_string()),
            intent: Some(Intent::CheatAttempt),
            ..Self::empty(true)
        }
    }

    pub fn guided(intent: Intent, explanation: String, follow_up_question: String) -> Self {
        Self {
            intent: Some(intent),
            explanation: Some(explanation),
            follow_up_question: Some(follow_up_question),
            suggestion: Some(CLARIFY_SUGGESTION.to_string()),
            ..Self::empty(true)
        }
    }

    pub fn degraded(intent: Intent) -> Self {
        Self {
            intent: Some(intent),
            explanation: Some(DEGRADED_EXPLANATION.to_string()),
            suggestion: Some(DEGRADED_SUGGESTION.to_string()),
            ..Self::empty(true)
        }
    }

    pub fn question_required() -> Self {
        Self {
            message: Some(QUESTION_REQUIRED.to_string()),
            ..Self::empty(false)
        }
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self {
            message: Some(GENERIC_APOLOGY.to_string()),
            error: Some(detail.into()),
            ..Self::empty(false)
        }
    }
}

/// Whether the explanation came from the backend or from the canned fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Generated,
    Degraded,
}

/// Builds the system instruction: fixed policy plus an optional lesson excerpt.
pub fn build_system_prompt(context: Option<&LessonContext>) -> String {
    let mut prompt = String::from(TUTOR_POLICY);
    if let Some(context) = context {
        let excerpt: String = context.content.chars().take(LESSON_EXCERPT_CHARS).collect();
        prompt.push_str("\n\nThe student is currently studying the lesson \"");
        prompt.push_str(&context.title);
        prompt.push_str("\". Lesson content:\n---\n");
        prompt.push_str(&excerpt);
        prompt.push_str("\n---");
    }
    prompt
}

/// Picks a follow-up question uniformly at random.
pub fn pick_follow_up() -> String {
    FOLLOW_UP_QUESTIONS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(FOLLOW_UP_QUESTIONS[0])
        .to_string()
}

/// Asks the generative backend for a guided explanation.
///
/// Never fails: backend errors, timeouts and empty completions all fall back to
/// the degraded response.
pub async fn compose_guided_response(
    generator: &dyn GenerativeTextService,
    question: &str,
    intent: Intent,
    context: Option<&LessonContext>,
    timeout: Duration,
) -> (TutorResponse, Generation) {
    let request = CompletionRequest {
        system_prompt: build_system_prompt(context),
        user_message: question.to_string(),
        max_tokens: MAX_OUTPUT_TOKENS,
        temperature: TEMPERATURE,
    };

    match with_timeout(timeout, generator.complete(request)).await {
        Ok(text) if !text.trim().is_empty() => {
            info!(generation = "ok", %intent, "Guided explanation generated");
            (
                TutorResponse::guided(intent, text.trim().to_string(), pick_follow_up()),
                Generation::Generated,
            )
        }
        Ok(_) => {
            warn!(generation = "degraded", %intent, "Generative backend returned no text");
            (TutorResponse::degraded(intent), Generation::Degraded)
        }
        Err(e) => {
            warn!(generation = "degraded", %intent, error = %e, "Generative backend failed");
            (TutorResponse::degraded(intent), Generation::Degraded)
        }
    }
}
